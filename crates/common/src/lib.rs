//! LinkForge Common Library
//!
//! Shared code for the link graph engine and its gateway including:
//! - Domain types (articles, internal/external links, authority domains)
//! - Graph repository contract with SeaORM and in-memory backends
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{GraphRepository, InMemoryRepository, Repository};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
