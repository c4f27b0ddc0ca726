//! Configuration management for linkhawk
//!
//! This module handles loading and validating configuration from
//! environment variables and TOML files. All components receive an
//! explicit config object; there is no module-level global state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::models::DeprecationPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalogue to crawl
    pub catalogue: CatalogueConfig,

    /// Liveness checker configuration
    pub checker: CheckerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Catalogue endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// OGC-API-Features base URL
    pub base_url: String,

    /// Collection identifier within the catalogue
    pub collection: String,
}

impl CatalogueConfig {
    /// The collection's items endpoint
    pub fn items_url(&self) -> String {
        format!(
            "{}/collections/{}/items",
            self.base_url.trim_end_matches('/'),
            self.collection
        )
    }

    /// Canonical item URL for a record id, as persisted in `records.record_id`
    pub fn record_url(&self, record_id: &str) -> String {
        format!("{}/{}", self.items_url(), record_id)
    }
}

/// Liveness checker and harvester configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Bounded worker-pool size for concurrent probing and harvesting
    pub workers: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Consecutive failures before a link is marked deprecated
    pub max_failures: i32,

    /// Deprecation semantics (self-healing or sticky)
    pub deprecation_policy: DeprecationPolicy,
}

impl CheckerConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,

    /// Optional schema, applied as `search_path`
    pub schema: Option<String>,

    /// Maximum pool size
    pub pool_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Catalogue and database variables use conventional names
    /// (`OGCAPI_URL`, `POSTGRES_HOST`, ...); tool tunables use the
    /// `LINKHAWK_` prefix.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("OGCAPI_URL")
            .unwrap_or_else(|_| String::from("https://demo.pycsw.org/gisdata"));
        let collection =
            std::env::var("OGCAPI_COLLECTION").unwrap_or_else(|_| String::from("metadata:main"));

        let workers = env_parse::<usize>("LINKHAWK_WORKERS").unwrap_or(5);
        let timeout_secs = env_parse::<u64>("LINKHAWK_TIMEOUT").unwrap_or(5);
        let max_failures = env_parse::<i32>("LINKHAWK_MAX_FAILURES").unwrap_or(10);

        let user_agent = std::env::var("LINKHAWK_USER_AGENT")
            .unwrap_or_else(|_| format!("linkhawk/{}", env!("CARGO_PKG_VERSION")));

        let deprecation_policy = env_parse::<DeprecationPolicy>("LINKHAWK_DEPRECATION_POLICY")
            .unwrap_or_default();

        let host = std::env::var("POSTGRES_HOST").unwrap_or_else(|_| String::from("localhost"));
        let port = env_parse::<u16>("POSTGRES_PORT").unwrap_or(5432);
        let dbname = std::env::var("POSTGRES_DB").unwrap_or_else(|_| String::from("linkhawk"));
        let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| String::from("postgres"));
        let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
        let schema = std::env::var("POSTGRES_SCHEMA").ok().filter(|s| !s.is_empty());
        let pool_size = env_parse::<usize>("LINKHAWK_POOL_SIZE").unwrap_or(4);

        let level = std::env::var("LINKHAWK_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));
        let format = std::env::var("LINKHAWK_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            catalogue: CatalogueConfig {
                base_url,
                collection,
            },
            checker: CheckerConfig {
                workers,
                timeout_secs,
                user_agent,
                max_failures,
                deprecation_policy,
            },
            database: DatabaseConfig {
                host,
                port,
                dbname,
                user,
                password,
                schema,
                pool_size,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.catalogue.base_url.starts_with("http") {
            anyhow::bail!("catalogue.base_url must be an http(s) URL");
        }

        if self.catalogue.collection.is_empty() {
            anyhow::bail!("catalogue.collection must not be empty");
        }

        if self.checker.workers == 0 {
            anyhow::bail!("checker.workers must be greater than 0");
        }

        if self.checker.timeout_secs == 0 {
            anyhow::bail!("checker.timeout_secs must be greater than 0");
        }

        if self.checker.max_failures <= 0 {
            anyhow::bail!("checker.max_failures must be greater than 0");
        }

        if self.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalogue: CatalogueConfig {
                base_url: String::from("https://demo.pycsw.org/gisdata"),
                collection: String::from("metadata:main"),
            },
            checker: CheckerConfig {
                workers: 5,
                timeout_secs: 5,
                user_agent: format!("linkhawk/{}", env!("CARGO_PKG_VERSION")),
                max_failures: 10,
                deprecation_policy: DeprecationPolicy::SelfHealing,
            },
            database: DatabaseConfig {
                host: String::from("localhost"),
                port: 5432,
                dbname: String::from("linkhawk"),
                user: String::from("postgres"),
                password: String::new(),
                schema: None,
                pool_size: 4,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_workers() {
        let mut config = Config::default();
        config.checker.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.catalogue.base_url = String::from("ftp://example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_items_url_strips_trailing_slash() {
        let catalogue = CatalogueConfig {
            base_url: String::from("https://catalogue.example.org/"),
            collection: String::from("metadata:main"),
        };
        assert_eq!(
            catalogue.items_url(),
            "https://catalogue.example.org/collections/metadata:main/items"
        );
        assert_eq!(
            catalogue.record_url("abc-123"),
            "https://catalogue.example.org/collections/metadata:main/items/abc-123"
        );
    }

    #[test]
    fn test_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.checker.timeout(), Duration::from_secs(5));
    }
}
