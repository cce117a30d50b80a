//! External link entity (article -> outside URL)

use crate::domain::ExternalLink;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "external_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub article_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    #[sea_orm(column_type = "Text")]
    pub domain: String,

    pub is_broken: bool,

    pub last_verified_at: Option<DateTimeWithTimeZone>,

    pub status_code: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::Id",
        on_delete = "Cascade"
    )]
    Article,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExternalLink {
    fn from(row: Model) -> Self {
        ExternalLink {
            id: row.id,
            article_id: row.article_id,
            url: row.url,
            domain: row.domain,
            is_broken: row.is_broken,
            last_verified_at: row.last_verified_at.map(|t| t.with_timezone(&Utc)),
            status_code: row.status_code.and_then(|c| u16::try_from(c).ok()),
            last_error: row.last_error,
        }
    }
}
