//! Configuration management for the DogWorld server.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Storage configuration
    pub database: DatabaseConfig,
    /// Marketplace behavior
    pub marketplace: MarketplaceConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Metrics server port (Prometheus scraping)
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL; in-memory storage when unset
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Marketplace behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// JSON file holding the account table
    pub accounts_file: Option<PathBuf>,
    /// Base URL that image paths are resolved against
    pub public_base_url: String,
    /// Image shown for listings without one
    pub placeholder_image_path: String,
    /// Insert the default listings into an empty store at startup
    pub seed_default_listings: bool,
    /// Buffered events per notification observer
    pub notify_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_var(&lookup, "PORT").unwrap_or(8080),
                metrics_port: parse_var(&lookup, "METRICS_PORT").unwrap_or(9090),
                shutdown_timeout: parse_var(&lookup, "SHUTDOWN_TIMEOUT").unwrap_or(30),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            },
            marketplace: MarketplaceConfig {
                accounts_file: lookup("ACCOUNTS_FILE").map(PathBuf::from),
                public_base_url: lookup("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:5000".to_string()),
                placeholder_image_path: lookup("PLACEHOLDER_IMAGE_PATH")
                    .unwrap_or_else(|| "uploads/placeholder-image.jpg".to_string()),
                seed_default_listings: parse_var(&lookup, "SEED_DEFAULT_LISTINGS").unwrap_or(true),
                notify_capacity: parse_var(&lookup, "NOTIFY_CAPACITY")
                    .unwrap_or(dogworld_core::notify::DEFAULT_CAPACITY),
            },
        }
    }

    /// Server bind address.
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Metrics server bind address.
    #[must_use]
    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.metrics_port)
    }
}

fn parse_var<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.server_address(), "0.0.0.0:8080");
        assert_eq!(config.metrics_address(), "0.0.0.0:9090");
        assert_eq!(config.server.shutdown_timeout, 30);
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 10);
        assert!(config.marketplace.accounts_file.is_none());
        assert_eq!(config.marketplace.public_base_url, "http://localhost:5000");
        assert!(config.marketplace.seed_default_listings);
        assert_eq!(
            config.marketplace.notify_capacity,
            dogworld_core::notify::DEFAULT_CAPACITY
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("DATABASE_URL", "postgres://localhost/dogworld"),
            ("ACCOUNTS_FILE", "/etc/dogworld/accounts.json"),
            ("SEED_DEFAULT_LISTINGS", "false"),
            ("NOTIFY_CAPACITY", "16"),
        ]);

        assert_eq!(config.server_address(), "127.0.0.1:3000");
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://localhost/dogworld")
        );
        assert_eq!(
            config.marketplace.accounts_file,
            Some(PathBuf::from("/etc/dogworld/accounts.json"))
        );
        assert!(!config.marketplace.seed_default_listings);
        assert_eq!(config.marketplace.notify_capacity, 16);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("DATABASE_URL", "  ")]);

        assert_eq!(config.server.port, 8080);
        assert!(config.database.url.is_none());
    }
}
