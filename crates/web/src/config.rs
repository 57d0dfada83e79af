//! Web configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target a local development checkout.
//!
//! - `PLAYDECK_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`,
//!   default: `sqlite://data/playdeck.db?mode=rwc`)
//! - `PLAYDECK_HOST` - Bind address (default: 127.0.0.1)
//! - `PLAYDECK_PORT` - Listen port (default: 5000)
//! - `PLAYDECK_BASE_URL` - Public URL, `https://` enables secure cookies
//!   (default: `http://localhost:5000`)
//! - `PLAYDECK_DATASET_PATH` - Listening dataset CSV (default: `datasets/spotify.csv`)
//! - `PLAYDECK_DATASET_CACHE_SECS` - How long a parsed dataset is reused (default: 60)
//! - `PLAYDECK_STATIC_DIR` - Static assets directory (default: `crates/web/static`)
//! - `PLAYDECK_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance traces sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/playdeck.db?mode=rwc";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Listening dataset configuration
    pub dataset: DatasetConfig,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Emit JSON formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance traces sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Where the listening dataset lives and how long a parsed copy is reused.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Path to the CSV file.
    pub path: PathBuf,
    /// Time-to-live of a cached parse.
    pub cache_ttl: Duration,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PLAYDECK_DATABASE_URL");
        let host = parse_env("PLAYDECK_HOST", "127.0.0.1")?;
        let port = parse_env("PLAYDECK_PORT", "5000")?;
        let base_url = get_env_or_default("PLAYDECK_BASE_URL", "http://localhost:5000");

        let dataset = DatasetConfig {
            path: PathBuf::from(get_env_or_default(
                "PLAYDECK_DATASET_PATH",
                "datasets/spotify.csv",
            )),
            cache_ttl: Duration::from_secs(parse_env("PLAYDECK_DATASET_CACHE_SECS", "60")?),
        };

        let static_dir = PathBuf::from(get_env_or_default(
            "PLAYDECK_STATIC_DIR",
            "crates/web/static",
        ));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            dataset,
            static_dir,
            log_json: get_optional_env("PLAYDECK_LOG_JSON").is_some(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`, then the local default.
fn get_database_url(primary_key: &str) -> SecretString {
    let value = std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());
    SecretString::from(value)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
