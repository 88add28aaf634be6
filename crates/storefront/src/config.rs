//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VAPORWISE_API_URL` - Base URL of the remote recommendation API
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `STOREFRONT_FIXTURES_DIR` - Directory holding the YAML fixtures
//!   (default: crates/storefront/fixtures)
//! - `API_CACHE_TTL_SECS` - Read cache TTL (default: 300)
//! - `API_MAX_RETRIES` - Extra attempts for failed reads (default: 2)
//! - `API_RETRY_BASE_MS` - First backoff delay (default: 1000)
//! - `API_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory with explore templates, demo results and the scoring catalog
    pub fixtures_dir: PathBuf,
    /// Remote API client settings
    pub api: ApiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Remote API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.vaporwise.example/v1`
    pub base_url: Url,
    /// How long cached reads stay fresh
    pub cache_ttl: Duration,
    /// Additional attempts after a failed read
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt
    pub retry_base_delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Default settings for an API at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            cache_ttl: Duration::from_secs(300),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(15),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host: IpAddr = env.parse_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port: u16 = env.parse_or("STOREFRONT_PORT", "3000")?;
        let base_url = env.or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let fixtures_dir =
            PathBuf::from(env.or_default("STOREFRONT_FIXTURES_DIR", "crates/storefront/fixtures"));

        let api = ApiConfig {
            base_url: parse_api_url(&env.required("VAPORWISE_API_URL")?)?,
            cache_ttl: Duration::from_secs(env.parse_or("API_CACHE_TTL_SECS", "300")?),
            max_retries: env.parse_or("API_MAX_RETRIES", "2")?,
            retry_base_delay: Duration::from_millis(env.parse_or("API_RETRY_BASE_MS", "1000")?),
            timeout: Duration::from_secs(env.parse_or("API_TIMEOUT_SECS", "15")?),
        };

        let sentry_sample_rate = env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate = env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?;

        Ok(Self {
            host,
            port,
            base_url,
            fixtures_dir,
            api,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// The API URL must be absolute http(s).
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("VAPORWISE_API_URL".to_string(), msg);
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("VAPORWISE_API_URL", "http://localhost:4000/api")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.api.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.api.retry_base_delay, Duration::from_millis(1000));
        assert_eq!(
            config.fixtures_dir,
            PathBuf::from("crates/storefront/fixtures")
        );
        assert!(config.sentry_dsn.is_none());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "VAPORWISE_API_URL"));
    }

    #[test]
    fn test_api_url_must_be_http() {
        let err = load(&[("VAPORWISE_API_URL", "ftp://files.example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = load(&[("VAPORWISE_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("VAPORWISE_API_URL", "https://api.example.com"),
            ("STOREFRONT_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("VAPORWISE_API_URL", "https://api.example.com"),
            ("STOREFRONT_HOST", "0.0.0.0"),
            ("STOREFRONT_PORT", "8080"),
            ("STOREFRONT_BASE_URL", "https://vaporwise.example"),
            ("API_MAX_RETRIES", "0"),
            ("API_RETRY_BASE_MS", "50"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
            ("SENTRY_TRACES_SAMPLE_RATE", "0.25"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.api.retry_base_delay, Duration::from_millis(50));
        assert!(config.is_secure());
        assert!(config.sentry_dsn.is_some());
        assert!((config.sentry_traces_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = load(&[
            ("VAPORWISE_API_URL", "https://api.example.com"),
            ("STOREFRONT_PORT", "  "),
            ("SENTRY_DSN", ""),
        ])
        .unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.sentry_dsn.is_none());
    }
}
