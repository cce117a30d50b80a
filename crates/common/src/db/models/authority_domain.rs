//! Curated authority domain entity

use crate::domain::DomainEntry;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authority_domains")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub domain: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub homepage: Option<String>,

    /// government, organization, reference, news, authority
    #[sea_orm(column_type = "Text")]
    pub category: String,

    /// JSON array of country codes
    #[sea_orm(column_type = "JsonBinary")]
    pub countries: Json,

    /// JSON array of topic tags
    #[sea_orm(column_type = "JsonBinary")]
    pub topics: Json,

    pub trust_score: i16,

    pub is_active: bool,

    pub auto_discovered: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn string_list(value: Json) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

impl From<Model> for DomainEntry {
    fn from(row: Model) -> Self {
        DomainEntry {
            domain: row.domain,
            homepage: row.homepage,
            category: row.category.into(),
            countries: string_list(row.countries),
            topics: string_list(row.topics),
            trust_score: row.trust_score.clamp(0, 100) as u8,
            is_active: row.is_active,
            auto_discovered: row.auto_discovered,
        }
    }
}
