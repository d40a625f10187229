//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Environment variable prefix shared by every configuration key.
const ENV_PREFIX: &str = "COMMENTABLE";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Listing defaults and bounds.
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Comment thread policy.
    #[serde(default)]
    pub comments: CommentConfig,
    /// Moderation policy.
    #[serde(default)]
    pub moderation: ModerationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    #[serde(default = "default_url")]
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Pagination configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when a resource has no default of its own.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Upper bound for any requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

/// Comment configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CommentConfig {
    /// Deepest reply level accepted on create. Top-level comments have depth 0.
    #[serde(default = "default_max_reply_depth")]
    pub max_reply_depth: i32,
}

/// Moderation configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ModerationConfig {
    /// Pending reports on one comment that flag it for review.
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_reply_depth: default_max_reply_depth(),
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            flag_threshold: default_flag_threshold(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_url() -> String {
    "http://localhost:3000".to_string()
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_page_size() -> u64 {
    20
}

const fn default_max_page_size() -> u64 {
    100
}

const fn default_max_reply_depth() -> i32 {
    5
}

const fn default_flag_threshold() -> u64 {
    3
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, exported into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `COMMENTABLE_ENV`)
    /// 4. Environment variables with `COMMENTABLE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("COMMENTABLE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration suitable for tests: a database URL and defaults everywhere else.
    #[must_use]
    pub fn for_database_url(url: &str) -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                url: default_url(),
            },
            database: DatabaseConfig {
                url: url.to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
            },
            pagination: PaginationConfig::default(),
            comments: CommentConfig::default(),
            moderation: ModerationConfig::default(),
        }
    }
}
