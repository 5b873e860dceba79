//! Engine configuration loaded from environment variables.
//!
//! Everything the orchestrator and adapters need is passed in explicitly at
//! construction time; nothing reads global configuration from deep inside
//! adapter code.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPSYNC_DATABASE_URL` - SQLite connection string
//!   (e.g. `sqlite://shopsync.db`)
//!
//! ## Optional
//! - `SHOPSYNC_LOOKBACK_DAYS` - order lookback window in days (default: 30)
//! - `SHOPSYNC_HTTP_TIMEOUT_SECS` - upstream call timeout (default: 30)
//! - `SHOPSYNC_MAX_CONCURRENT_STORES` - sweep fan-out bound (default: 4)
//! - `SHOPSYNC_SHOPIFY_API_VERSION` - Shopify Admin API version
//!   (default: 2023-10)

use std::fmt::Display;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_LOOKBACK_DAYS: i64 = 30;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENT_STORES: usize = 4;
const DEFAULT_SHOPIFY_API_VERSION: &str = "2023-10";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// SQLite database URL (may embed a filesystem path).
    pub database_url: SecretString,
    /// How far back order sweeps look, in days.
    pub lookback_days: i64,
    /// Timeout applied to every upstream HTTP call.
    pub http_timeout_secs: u64,
    /// How many stores a sweep processes concurrently.
    pub max_concurrent_stores: usize,
    /// Shopify Admin REST API version segment.
    pub shopify_api_version: String,
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or an optional
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: SecretString::from(get_required_env("SHOPSYNC_DATABASE_URL")?),
            lookback_days: get_parsed_or("SHOPSYNC_LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?,
            http_timeout_secs: get_parsed_or(
                "SHOPSYNC_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            max_concurrent_stores: get_parsed_or(
                "SHOPSYNC_MAX_CONCURRENT_STORES",
                DEFAULT_MAX_CONCURRENT_STORES,
            )?,
            shopify_api_version: get_env_or_default(
                "SHOPSYNC_SHOPIFY_API_VERSION",
                DEFAULT_SHOPIFY_API_VERSION,
            ),
        })
    }

    /// Configuration with defaults for everything but the database location.
    ///
    /// Useful for tests and for embedding the engine.
    #[must_use]
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: SecretString::from(database_url.into()),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_concurrent_stores: DEFAULT_MAX_CONCURRENT_STORES,
            shopify_api_version: DEFAULT_SHOPIFY_API_VERSION.to_owned(),
        }
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn get_parsed_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_database_url_uses_defaults() {
        let config = SyncConfig::with_database_url("sqlite::memory:");
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.max_concurrent_stores, 4);
        assert_eq!(config.shopify_api_version, "2023-10");
    }

    #[test]
    fn test_required_env_reports_missing_variable() {
        // This variable is never set anywhere.
        assert!(matches!(
            get_required_env("SHOPSYNC_TEST_UNSET_VAR"),
            Err(ConfigError::MissingEnvVar(var)) if var == "SHOPSYNC_TEST_UNSET_VAR"
        ));
    }

    #[test]
    fn test_parsed_or_falls_back_to_default() {
        let value: i64 =
            get_parsed_or("SHOPSYNC_TEST_UNSET_VAR", 17).expect("default applies");
        assert_eq!(value, 17);
    }
}
