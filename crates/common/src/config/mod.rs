//! Configuration management for LinkForge services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use crate::domain::StatusScope;
use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Link graph engine tuning
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// Engine tuning, one section per component
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct EngineConfig {
    #[serde(default)]
    #[validate(nested)]
    pub authority: AuthorityConfig,

    #[serde(default)]
    #[validate(nested)]
    pub balance: BalanceConfig,

    #[serde(default)]
    #[validate(nested)]
    pub suggestions: SuggestionConfig,

    #[serde(default)]
    #[validate(nested)]
    pub verifier: VerifierConfig,

    #[serde(default)]
    #[validate(nested)]
    pub repair: RepairConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AuthorityConfig {
    /// Damping factor (typically 0.85)
    #[serde(default = "default_damping")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub damping: f64,

    /// L1 convergence threshold
    #[serde(default = "default_epsilon")]
    #[validate(range(exclusive_min = 0.0))]
    pub epsilon: f64,

    /// Iteration cap
    #[serde(default = "default_max_iterations")]
    #[validate(range(min = 1))]
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_bands"))]
pub struct BalanceConfig {
    /// Imbalance ratio below this is "good"
    #[serde(default = "default_good_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub good_threshold: f64,

    /// Imbalance ratio below this is "warning", at or above it "poor"
    #[serde(default = "default_warning_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub warning_threshold: f64,

    /// Articles counted toward statistics and defects
    #[serde(default)]
    pub status_scope: StatusScope,

    /// Minimum inbound count before an article is flagged as over-linked
    #[serde(default = "default_concentration_floor")]
    pub concentration_floor: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SuggestionConfig {
    /// Maximum new links proposed for one source in one run
    #[serde(default = "default_max_links_per_run")]
    #[validate(range(min = 1))]
    pub max_links_per_run: usize,

    /// Outbound links every article should reach
    #[serde(default = "default_min_outbound_links")]
    pub min_outbound_links: usize,

    /// Cosine similarity below this is not suggested (except for the floor)
    #[serde(default = "default_min_similarity")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_similarity: f64,

    /// Anchor text length bound, in characters
    #[serde(default = "default_anchor_max_chars")]
    #[validate(range(min = 8))]
    pub anchor_max_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct VerifierConfig {
    /// Checks in flight at once
    #[serde(default = "default_verifier_concurrency")]
    #[validate(range(min = 1, max = 256))]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_verifier_timeout")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    /// Attempts per link, first try included
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Minimum spacing between two requests to the same host in milliseconds
    #[serde(default = "default_host_delay_ms")]
    pub host_delay_ms: u64,

    /// User agent sent with every check
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RepairConfig {
    /// Lowest trust score a replacement domain may have
    #[serde(default = "default_min_trust")]
    #[validate(range(max = 100))]
    pub min_trust_score: u8,

    /// Articles written concurrently during an applied repair
    #[serde(default = "default_write_concurrency")]
    #[validate(range(min = 1, max = 64))]
    pub write_concurrency: usize,
}

fn validate_bands(config: &BalanceConfig) -> std::result::Result<(), ValidationError> {
    if config.warning_threshold < config.good_threshold {
        return Err(ValidationError::new("warning_threshold_below_good_threshold"));
    }
    Ok(())
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 120 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "linkforge".to_string() }
fn default_damping() -> f64 { 0.85 }
fn default_epsilon() -> f64 { 1e-6 }
fn default_max_iterations() -> usize { 100 }
fn default_good_threshold() -> f64 { 0.2 }
fn default_warning_threshold() -> f64 { 0.4 }
fn default_concentration_floor() -> usize { 10 }
fn default_max_links_per_run() -> usize { 5 }
fn default_min_outbound_links() -> usize { 3 }
fn default_min_similarity() -> f64 { 0.05 }
fn default_anchor_max_chars() -> usize { 60 }
fn default_verifier_concurrency() -> usize { 10 }
fn default_verifier_timeout() -> u64 { 10 }
fn default_max_attempts() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 1000 }
fn default_host_delay_ms() -> u64 { 500 }
fn default_user_agent() -> String { format!("LinkForge-LinkChecker/{}", crate::VERSION) }
fn default_min_trust() -> u8 { 50 }
fn default_write_concurrency() -> usize { 4 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            epsilon: default_epsilon(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            good_threshold: default_good_threshold(),
            warning_threshold: default_warning_threshold(),
            status_scope: StatusScope::default(),
            concentration_floor: default_concentration_floor(),
        }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            max_links_per_run: default_max_links_per_run(),
            min_outbound_links: default_min_outbound_links(),
            min_similarity: default_min_similarity(),
            anchor_max_chars: default_anchor_max_chars(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            concurrency: default_verifier_concurrency(),
            timeout_secs: default_verifier_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            host_delay_ms: default_host_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl VerifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn host_delay(&self) -> Duration {
        Duration::from_millis(self.host_delay_ms)
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            min_trust_score: default_min_trust(),
            write_concurrency: default_write_concurrency(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__ENGINE__VERIFIER__CONCURRENCY=20
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check the engine tuning; violations are configuration errors
    pub fn validate(&self) -> Result<()> {
        self.engine.validate().map_err(|e| AppError::Configuration {
            message: format!("invalid engine configuration: {}", e),
        })
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/linkforge".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            observability: ObservabilityConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}
