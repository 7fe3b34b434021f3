//! Application configuration loaded from environment variables.

use std::time::Duration;

use catalog::CatalogConfig;
use stats::DEFAULT_STATS_TTL;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `5003`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; unset keeps orders in memory
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `REDIS_URL`: Redis URL for the stats cache; unset caches in memory
/// - `CATALOG_URL`: catalog base URL (default: `"http://localhost:5002"`)
/// - `CATALOG_ITEM_PATH`: item path template (default: `"/items/{id}"`)
/// - `CATALOG_TIMEOUT_MS`: catalog lookup timeout (default: `5000`)
/// - `JWT_SECRET`: HS256 secret for bearer tokens
/// - `STATS_TTL_SECS`: stats cache TTL (default: `300`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub catalog: CatalogConfig,
    pub jwt_secret: String,
    pub stats_ttl: Duration,
}

const DEFAULT_PORT: u16 = 5003;
const DEFAULT_JWT_SECRET: &str = "dev-secret-key-change-in-production";

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    ///
    /// Unparseable numbers fall back to their defaults; empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let catalog = CatalogConfig {
            base_url: var("CATALOG_URL").unwrap_or(defaults.catalog.base_url),
            item_path: var("CATALOG_ITEM_PATH").unwrap_or(defaults.catalog.item_path),
            timeout: var("CATALOG_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.catalog.timeout),
        };

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match var("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            database_url: var("DATABASE_URL"),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.database_max_connections),
            redis_url: var("REDIS_URL"),
            catalog,
            jwt_secret: var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            stats_ttl: var("STATS_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.stats_ttl),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            redis_url: None,
            catalog: CatalogConfig::default(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            stats_ttl: DEFAULT_STATS_TTL,
        }
    }
}
