//! Database layer for LinkForge
//!
//! Provides:
//! - The graph repository contract the engine reads from and writes through
//! - SeaORM entity models and a Postgres-backed repository
//! - An in-memory repository for tests and local runs
//! - Connection pool management

pub mod models;
mod memory;
mod repository;

pub use memory::{GraphSeed, InMemoryRepository};
pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::domain::{
    Article, DomainEntry, ExternalLink, ExternalLinkFilter, InternalLink, Platform, UpsertOutcome,
};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Source and sink of the link graph.
///
/// The repository owns durability; the engine only reads snapshots and writes
/// single edges back. Implementations must make `upsert_internal_link`
/// idempotent per (source, target) pair.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Check connectivity
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_platform(&self, platform_id: Uuid) -> Result<Option<Platform>>;

    async fn find_article(&self, article_id: Uuid) -> Result<Option<Article>>;

    /// All articles of a platform, optionally restricted to one language
    async fn load_articles(&self, platform_id: Uuid, language: Option<&str>) -> Result<Vec<Article>>;

    /// All internal links whose source article belongs to the platform
    async fn load_internal_links(&self, platform_id: Uuid) -> Result<Vec<InternalLink>>;

    async fn load_external_links(&self, filter: &ExternalLinkFilter) -> Result<Vec<ExternalLink>>;

    /// Insert a link unless one already exists for the same (source, target)
    async fn upsert_internal_link(&self, link: &InternalLink) -> Result<UpsertOutcome>;

    /// Persist verification or repair state of an external link
    async fn update_external_link(&self, link: &ExternalLink) -> Result<()>;

    async fn load_authority_domains(&self) -> Result<Vec<DomainEntry>>;
}

/// Reject edges the graph must never contain
pub(crate) fn check_internal_link(link: &InternalLink) -> Result<()> {
    if link.source_article_id == link.target_article_id {
        return Err(AppError::validation(
            "target_article_id",
            format!("self-link on article {}", link.source_article_id),
        ));
    }
    Ok(())
}

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: DatabaseConnection,

    /// Read replica connection (optional)
    pub replica: Option<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");

        let primary = Database::connect(connect_options(&config.url, config))
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to primary: {}", e),
            })?;

        // Connect to replica if configured
        let replica = if let Some(ref read_url) = config.read_url {
            info!("Connecting to read replica...");

            let replica_conn = Database::connect(connect_options(read_url, config))
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Failed to connect to replica: {}", e),
                })?;

            Some(replica_conn)
        } else {
            None
        };

        info!("Database connections established");

        Ok(Self { primary, replica })
    }

    /// Get the connection for reads (replica if available, otherwise primary)
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    /// Get the connection for writes (always primary)
    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        use sea_orm::ConnectionTrait;

        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Primary ping failed: {}", e),
            })?;

        if let Some(ref replica) = self.replica {
            replica
                .execute_unprepared("SELECT 1")
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Replica ping failed: {}", e),
                })?;
        }

        Ok(())
    }
}

fn connect_options(url: &str, config: &DatabaseConfig) -> ConnectOptions {
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .sqlx_logging(false);
    opts
}
