//! Log server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `LOG_SERVER_HOST` - Bind address (default: 127.0.0.1)
//! - `LOG_SERVER_PORT` - Listen port (default: 8000)
//! - `LOG_SERVER_DIR` - Directory holding `error.log` (default: logs)
//! - `LOG_SERVER_ALLOWED_ORIGIN` - CORS origin of the storefront UI (default: <http://localhost:5173>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log server configuration.
#[derive(Debug, Clone)]
pub struct LogServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory the error log is written to
    pub logs_dir: PathBuf,
    /// Origin allowed to post reports from a browser
    pub allowed_origin: HeaderValue,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "development")
    pub sentry_environment: Option<String>,
}

impl LogServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("LOG_SERVER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LOG_SERVER_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("LOG_SERVER_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LOG_SERVER_PORT".to_string(), e.to_string()))?;
        let logs_dir = PathBuf::from(get_env_or_default("LOG_SERVER_DIR", "logs"));
        let allowed_origin = parse_origin(&get_env_or_default(
            "LOG_SERVER_ALLOWED_ORIGIN",
            "http://localhost:5173",
        ))?;

        Ok(Self {
            host,
            port,
            logs_dir,
            allowed_origin,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Local-development configuration writing to `logs_dir`.
    #[must_use]
    pub fn local(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
            logs_dir: logs_dir.into(),
            allowed_origin: HeaderValue::from_static("http://localhost:5173"),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_origin(value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value.trim_end_matches('/')).map_err(|e| {
        ConfigError::InvalidEnvVar("LOG_SERVER_ALLOWED_ORIGIN".to_string(), e.to_string())
    })
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
