//! Internal link entity (article -> article)
//!
//! `(source_article_id, target_article_id)` carries a unique index; inserts
//! rely on it to ignore pairs that already exist.

use crate::domain::InternalLink;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "internal_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Article containing the link
    pub source_article_id: Uuid,

    /// Article being linked to
    pub target_article_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub anchor_text: String,

    /// Offset of the anchor in the source content
    pub position_in_content: Option<i32>,

    pub is_automatic: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::SourceArticleId",
        to = "super::article::Column::Id",
        on_delete = "Cascade"
    )]
    SourceArticle,

    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::TargetArticleId",
        to = "super::article::Column::Id",
        on_delete = "Cascade"
    )]
    TargetArticle,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for InternalLink {
    fn from(row: Model) -> Self {
        InternalLink {
            id: row.id,
            source_article_id: row.source_article_id,
            target_article_id: row.target_article_id,
            anchor_text: row.anchor_text,
            position: row.position_in_content,
            is_automatic: row.is_automatic,
            created_at: row.created_at.with_timezone(&Utc),
        }
    }
}

impl From<&InternalLink> for ActiveModel {
    fn from(link: &InternalLink) -> Self {
        ActiveModel {
            id: Set(link.id),
            source_article_id: Set(link.source_article_id),
            target_article_id: Set(link.target_article_id),
            anchor_text: Set(link.anchor_text.clone()),
            position_in_content: Set(link.position),
            is_automatic: Set(link.is_automatic),
            created_at: Set(link.created_at.into()),
        }
    }
}
