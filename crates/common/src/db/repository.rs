//! Postgres-backed graph repository
//!
//! Loads platform snapshots with a handful of set-based queries and writes
//! single edges back. Platform scoping of links goes through the source
//! article, so link tables carry no platform column.

use crate::db::models::*;
use crate::db::{check_internal_link, DbPool, GraphRepository};
use crate::domain::{
    Article, DomainEntry, ExternalLink, ExternalLinkFilter, InternalLink, Platform,
    UpsertOutcome, VerificationScope,
};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, Insert,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select, Set, Statement,
};
use tracing::debug;
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }
}

#[async_trait]
impl GraphRepository for Repository {
    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    async fn find_platform(&self, platform_id: Uuid) -> Result<Option<Platform>> {
        let row = PlatformEntity::find_by_id(platform_id)
            .one(self.read_conn())
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_article(&self, article_id: Uuid) -> Result<Option<Article>> {
        let row = ArticleEntity::find_by_id(article_id)
            .one(self.read_conn())
            .await?;
        Ok(row.map(Into::into))
    }

    async fn load_articles(&self, platform_id: Uuid, language: Option<&str>) -> Result<Vec<Article>> {
        let mut query = ArticleEntity::find()
            .filter(ArticleColumn::PlatformId.eq(platform_id))
            .order_by_asc(ArticleColumn::Id);

        if let Some(language) = language {
            query = query.filter(ArticleColumn::Language.eq(language));
        }

        let rows = query.all(self.read_conn()).await?;
        debug!(platform_id = %platform_id, count = rows.len(), "Loaded articles");

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn load_internal_links(&self, platform_id: Uuid) -> Result<Vec<InternalLink>> {
        let sql = r#"
            SELECT l.*
            FROM internal_links l
            INNER JOIN articles a ON l.source_article_id = a.id
            WHERE a.platform_id = $1
            ORDER BY l.created_at, l.id
        "#;

        let rows = InternalLinkEntity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                vec![platform_id.into()],
            ))
            .all(self.read_conn())
            .await
            .map_err(|e| AppError::Repository {
                message: format!("Failed to load internal links: {}", e),
            })?;

        debug!(platform_id = %platform_id, count = rows.len(), "Loaded internal links");

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn load_external_links(&self, filter: &ExternalLinkFilter) -> Result<Vec<ExternalLink>> {
        let rows = external_links_query(filter).all(self.read_conn()).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_internal_link(&self, link: &InternalLink) -> Result<UpsertOutcome> {
        check_internal_link(link)?;

        let inserted = internal_link_insert(link)
            .exec_without_returning(self.write_conn())
            .await?;

        if inserted == 0 {
            return Ok(UpsertOutcome::AlreadyExists);
        }

        Ok(UpsertOutcome::Inserted)
    }

    async fn update_external_link(&self, link: &ExternalLink) -> Result<()> {
        let model = ExternalLinkActiveModel {
            id: Set(link.id),
            url: Set(link.url.clone()),
            domain: Set(link.domain.clone()),
            is_broken: Set(link.is_broken),
            last_verified_at: Set(link.last_verified_at.map(Into::into)),
            status_code: Set(link.status_code.map(i32::from)),
            last_error: Set(link.last_error.clone()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.update(self.write_conn()).await?;
        Ok(())
    }

    async fn load_authority_domains(&self) -> Result<Vec<DomainEntry>> {
        let rows = AuthorityDomainEntity::find()
            .order_by_desc(AuthorityDomainColumn::TrustScore)
            .all(self.read_conn())
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// External links matching a filter. Platform scoping is a subquery on
/// articles so the statement size does not grow with the corpus.
fn external_links_query(filter: &ExternalLinkFilter) -> Select<ExternalLinkEntity> {
    let mut query = ExternalLinkEntity::find().order_by_asc(ExternalLinkColumn::Id);

    query = match filter.scope {
        VerificationScope::Unverified => query.filter(ExternalLinkColumn::LastVerifiedAt.is_null()),
        VerificationScope::Broken => query.filter(ExternalLinkColumn::IsBroken.eq(true)),
        VerificationScope::All => query,
    };

    if let Some(platform_id) = filter.platform_id {
        let articles = ArticleEntity::find()
            .select_only()
            .column(ArticleColumn::Id)
            .filter(ArticleColumn::PlatformId.eq(platform_id))
            .into_query();

        query = query.filter(ExternalLinkColumn::ArticleId.in_subquery(articles));
    }

    if let Some(limit) = filter.limit {
        query = query.limit(limit as u64);
    }

    query
}

/// Insert that leaves an existing (source, target) pair untouched; relies on
/// the unique index over those two columns
fn internal_link_insert(link: &InternalLink) -> Insert<InternalLinkActiveModel> {
    InternalLinkEntity::insert(InternalLinkActiveModel::from(link)).on_conflict(
        OnConflict::columns([
            InternalLinkColumn::SourceArticleId,
            InternalLinkColumn::TargetArticleId,
        ])
        .do_nothing()
        .to_owned(),
    )
}
