//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BAZAAR_API_URL` - Storefront REST API base URL (default: `http://localhost:8000/api`)
//! - `BAZAAR_API_TOKEN` - Bearer token sent with API requests
//! - `BAZAAR_LOG_SERVER_URL` - Log sidecar base URL (default: `http://localhost:8000`)
//! - `BAZAAR_DATA_DIR` - Directory for the persisted cart (default: `.bazaar`)
//! - `BAZAAR_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront REST API (no trailing slash)
    pub api_url: Url,
    /// Bearer token for authenticated requests
    pub api_token: Option<SecretString>,
    /// Base URL of the local log sidecar
    pub log_server_url: Url,
    /// Directory holding the persisted cart
    pub data_dir: PathBuf,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
}

impl ClientConfig {
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

        let api_url = parse_url(
            "BAZAAR_API_URL",
            &get_env_or_default("BAZAAR_API_URL", "http://localhost:8000/api"),
        )?;
        let log_server_url = parse_url(
            "BAZAAR_LOG_SERVER_URL",
            &get_env_or_default("BAZAAR_LOG_SERVER_URL", "http://localhost:8000"),
        )?;
        let api_token = get_optional_env("BAZAAR_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);
        let data_dir = PathBuf::from(get_env_or_default("BAZAAR_DATA_DIR", ".bazaar"));
        let timeout_secs = get_env_or_default("BAZAAR_HTTP_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BAZAAR_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_url,
            api_token,
            log_server_url,
            data_dir,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Configuration pointing at the given API, with defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not a valid URL.
    pub fn for_api(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_url("api_url", api_url)?,
            api_token: None,
            log_server_url: parse_url("log_server_url", "http://localhost:8000")?,
            data_dir: PathBuf::from(".bazaar"),
            http_timeout: Duration::from_secs(10),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL, stripping any trailing slash so paths can be appended.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim_end_matches('/'))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
