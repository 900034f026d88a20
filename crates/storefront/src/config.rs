//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMMERCE_API_BASE_URL` - Base URL of the commerce REST backend
//! - `COMMERCE_API_TOKEN` - Backend API access token
//!
//! ## Optional
//! - `COMMERCE_API_VERSION` - Backend API version segment (default: v1)
//! - `STOREFRONT_MAX_VISIBLE_PAGES` - Width of the pagination window (default: 6)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_API_TOKEN_LENGTH: usize = 20;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Commerce backend configuration
    pub backend: BackendConfig,
    /// Width of the pagination window on listing pages
    pub max_visible_pages: u32,
}

/// Commerce REST backend configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., <https://api.papercranetoys.com>)
    pub base_url: Url,
    /// API version segment (e.g., v1)
    pub api_version: String,
    /// API access token (server-side only)
    pub api_token: SecretString,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API token fails placeholder/length validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = BackendConfig::from_env()?;
        let max_visible_pages = get_env_or_default("STOREFRONT_MAX_VISIBLE_PAGES", "6")
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_MAX_VISIBLE_PAGES".to_string(), e.to_string())
            })?;

        Ok(Self {
            backend,
            max_visible_pages,
        })
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("COMMERCE_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("COMMERCE_API_BASE_URL".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            api_version: get_env_or_default("COMMERCE_API_VERSION", "v1"),
            api_token: get_validated_secret("COMMERCE_API_TOKEN")?,
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

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a secret is not a placeholder and has a plausible length.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    if secret.len() < MIN_API_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_API_TOKEN_LENGTH} characters (got {})",
                secret.len()
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here-padded", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_too_short() {
        let result = validate_secret_strength("sk_live_short", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("sk_live_aB3xY9mK2nL5pQ7rT0uW4", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_backend_config_debug_redacts_token() {
        let config = BackendConfig {
            base_url: "https://api.papercranetoys.test".parse().unwrap(),
            api_version: "v1".to_string(),
            api_token: SecretString::from("super_secret_api_token"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("api.papercranetoys.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_token"));
    }
}
