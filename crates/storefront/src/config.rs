//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COPPERLEAF_API_BASE_URL` - Base URL of the order backend (e.g., <https://api.copperleaf.dev/api>)
//! - `COPPERLEAF_PAYMENT_PUBLISHABLE_KEY` - Payment processor publishable key
//!
//! ## Optional
//! - `COPPERLEAF_PAYMENT_API_BASE` - Payment processor base URL (default: <https://api.stripe.com>)
//! - `COPPERLEAF_REQUEST_TIMEOUT_SECS` - Per-request timeout for both the
//!   backend and payment processor clients (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "dummy",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure value in {0}: {1}")]
    InsecureValue(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Order backend API configuration
    pub api: ApiConfig,
    /// Payment processor configuration
    pub payment: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g., "production")
    pub sentry_environment: Option<String>,
}

/// Order backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the order backend, including any path prefix.
    pub base_url: Url,
    /// Per-request timeout. A hung call is surfaced as a failed attempt,
    /// never left pending indefinitely.
    pub request_timeout: Duration,
}

/// Payment processor configuration.
///
/// Only the publishable key lives here: the storefront confirms payment
/// intents the way a browser client would, and never holds the
/// processor's secret key.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Payment processor API base URL.
    pub api_base: Url,
    /// Publishable key sent with every confirmation call.
    pub publishable_key: String,
    /// Per-request timeout, shared with the backend client. A hung
    /// confirmation call is surfaced as a failed attempt, never left
    /// pending indefinitely.
    pub request_timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid,
    /// or if the publishable key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let payment = PaymentConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            api,
            payment,
            sentry_dsn,
            sentry_environment,
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_url("COPPERLEAF_API_BASE_URL")?;
        let request_timeout = request_timeout_from_env()?;

        Ok(Self {
            base_url,
            request_timeout,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_base = Url::parse(&get_env_or_default(
            "COPPERLEAF_PAYMENT_API_BASE",
            "https://api.stripe.com",
        ))
        .map_err(|e| {
            ConfigError::InvalidEnvVar("COPPERLEAF_PAYMENT_API_BASE".to_string(), e.to_string())
        })?;

        let publishable_key = get_required_env("COPPERLEAF_PAYMENT_PUBLISHABLE_KEY")?;
        validate_not_placeholder(&publishable_key, "COPPERLEAF_PAYMENT_PUBLISHABLE_KEY")?;

        Ok(Self {
            api_base,
            publishable_key,
            request_timeout: request_timeout_from_env()?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable parsed as a URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let value = get_required_env(key)?;
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// The per-request timeout both HTTP clients are built with.
fn request_timeout_from_env() -> Result<Duration, ConfigError> {
    get_env_or_default("COPPERLEAF_REQUEST_TIMEOUT_SECS", "30")
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("COPPERLEAF_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })
}

/// Validate that a configured key is not an obvious placeholder.
fn validate_not_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureValue(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_key_rejected() {
        let result = validate_not_placeholder("pk_test_dummy", "TEST_VAR");
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureValue(_, _)
        ));
    }

    #[test]
    fn test_changeme_rejected() {
        assert!(validate_not_placeholder("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_real_looking_key_accepted() {
        assert!(validate_not_placeholder("pk_live_4eC39HqLyjWDarjtT1zdp7dc", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_env_or_default_falls_back() {
        let value = get_env_or_default("COPPERLEAF_DOES_NOT_EXIST_XYZ", "fallback");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_missing_required_env() {
        let err = get_required_env("COPPERLEAF_DOES_NOT_EXIST_XYZ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }
}
