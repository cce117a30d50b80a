//! Article entity

use crate::domain::Article;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub platform_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub language: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub country: Option<String>,

    /// pillar, satellite, landing, standard
    #[sea_orm(column_type = "Text")]
    pub content_type: String,

    /// draft, scheduled, published, archived
    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub pillar_id: Option<Uuid>,

    #[sea_orm(column_type = "Text", nullable)]
    pub topic: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::platform::Entity",
        from = "Column::PlatformId",
        to = "super::platform::Column::Id"
    )]
    Platform,

    #[sea_orm(has_many = "super::external_link::Entity")]
    ExternalLinks,
}

impl Related<super::platform::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Platform.def()
    }
}

impl Related<super::external_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExternalLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Article {
    fn from(row: Model) -> Self {
        Article {
            id: row.id,
            platform_id: row.platform_id,
            title: row.title,
            language: row.language,
            country: row.country,
            content_type: row.content_type.into(),
            status: row.status.into(),
            pillar_id: row.pillar_id,
            topic: row.topic,
            content: row.content,
        }
    }
}
