//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `SHOP_API_BASE_URL` - Backend origin (default: `http://localhost:8090`)
//! - `SHOP_AUTH_BASE_URL` - Origin serving `/auth/*` (default: the API base URL)
//! - `SHOP_CREDENTIALS_PATH` - Credential file (default: `$HOME/.onlineshop/credentials.json`)
//! - `SHOP_REQUEST_TIMEOUT_SECS` - Transport timeout in seconds (default: none)
//! - `SHOP_CLEAR_REJECTED_CREDENTIALS` - Clear persisted credentials when the
//!   backend rejects them with 401 during hydration (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::session::StaleCredentialPolicy;

/// Default backend origin.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8090";

const CREDENTIALS_DIR: &str = ".onlineshop";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend origin, without a trailing slash
    pub api_base_url: String,
    /// Origin for `/auth/login` and `/auth/register`, without a trailing slash
    pub auth_base_url: String,
    /// Where the bearer token and user id are persisted
    pub credentials_path: PathBuf,
    /// Transport timeout applied to every request
    pub request_timeout: Option<Duration>,
    /// What hydration does with credentials the backend rejects
    pub stale_credentials: StaleCredentialPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed, or if no
    /// credentials path can be derived.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base_url = validate_base_url(
            "SHOP_API_BASE_URL",
            &get("SHOP_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let auth_base_url = match get("SHOP_AUTH_BASE_URL") {
            Some(value) => validate_base_url("SHOP_AUTH_BASE_URL", &value)?,
            None => api_base_url.clone(),
        };

        let credentials_path = match get("SHOP_CREDENTIALS_PATH") {
            Some(path) => PathBuf::from(path),
            None => get("HOME")
                .or_else(|| get("USERPROFILE"))
                .map(|home| PathBuf::from(home).join(CREDENTIALS_DIR).join(CREDENTIALS_FILE))
                .ok_or_else(|| ConfigError::MissingEnvVar("SHOP_CREDENTIALS_PATH".to_string()))?,
        };

        let request_timeout = get("SHOP_REQUEST_TIMEOUT_SECS")
            .map(|value| parse_timeout("SHOP_REQUEST_TIMEOUT_SECS", &value))
            .transpose()?;

        let stale_credentials = match get("SHOP_CLEAR_REJECTED_CREDENTIALS") {
            Some(value) if parse_bool("SHOP_CLEAR_REJECTED_CREDENTIALS", &value)? => {
                StaleCredentialPolicy::ClearOnUnauthorized
            }
            _ => StaleCredentialPolicy::Keep,
        };

        Ok(Self {
            api_base_url,
            auth_base_url,
            credentials_path,
            request_timeout,
            stale_credentials,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }

    /// Configuration pointing at `base_url` for both API and auth, with the
    /// given credentials path and defaults elsewhere.
    #[must_use]
    pub fn for_base_url(base_url: &str, credentials_path: impl Into<PathBuf>) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            api_base_url: base.clone(),
            auth_base_url: base,
            credentials_path: credentials_path.into(),
            request_timeout: None,
            stale_credentials: StaleCredentialPolicy::default(),
            sentry_dsn: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Check that `value` is an absolute http(s) URL and strip trailing slashes.
fn validate_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}' (expected http or https)", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL must have a host".to_string(),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "base URL must not carry a query or fragment".to_string(),
        ));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

fn parse_timeout(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "timeout must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
