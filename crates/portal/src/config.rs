//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CRM_BACKEND_URL` - Base URL of the CRM backend RPC service
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3002)
//! - `PORTAL_BASE_URL` - Public URL of the portal (default: <http://localhost:3002>).
//!   An `https` URL turns on secure session cookies.
//! - `CRM_BACKEND_API_KEY` - Service key sent as a bearer token to the backend
//! - `CRM_REQUEST_TIMEOUT_SECS` - Backend request timeout, `0` disables (default: 30)
//! - `II_URL` - Identity provider URL (default: <https://identity.ic0.app>)
//! - `CRM_CACHE_TTL_SECS` - Account cache time-to-live (default: 300)
//! - `CRM_CACHE_CAPACITY` - Account cache entry limit (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)
//! - `PORTAL_LOG_JSON` - Emit JSON logs when set

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_IDENTITY_URL: &str = "https://identity.ic0.app";
const DEFAULT_BASE_URL: &str = "http://localhost:3002";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "replace", "placeholder", "xxx"];

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

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: Url,
    /// CRM backend connection
    pub backend: BackendConfig,
    /// Identity provider connection
    pub identity: IdentityConfig,
    /// Account cache sizing
    pub cache: CacheConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON-formatted logs
    pub log_json: bool,
}

/// CRM backend configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the RPC service
    pub url: Url,
    /// Optional service key
    pub api_key: Option<SecretString>,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Identity provider configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Provider base URL
    pub url: Url,
}

/// Account cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entry time-to-live
    pub ttl: Duration,
    /// Maximum number of entries
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: 10_000,
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("PORTAL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORTAL_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_PORT".to_string(), e.to_string()))?;
        let base_url = parse_url(
            "PORTAL_BASE_URL",
            &get_env_or_default("PORTAL_BASE_URL", DEFAULT_BASE_URL),
        )?;

        let backend = BackendConfig::from_env()?;
        let identity = IdentityConfig {
            url: parse_url(
                "II_URL",
                &get_env_or_default("II_URL", DEFAULT_IDENTITY_URL),
            )?,
        };
        let cache = CacheConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let log_json = get_optional_env("PORTAL_LOG_JSON").is_some();

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            identity,
            cache,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            log_json,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl BackendConfig {
    /// Load backend settings only. Used by the CLI, which has no server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CRM_BACKEND_URL` is missing or any value is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let url = parse_url("CRM_BACKEND_URL", &get_required_env("CRM_BACKEND_URL")?)?;
        let api_key = get_optional_env("CRM_BACKEND_API_KEY")
            .map(|key| {
                reject_placeholder(&key, "CRM_BACKEND_API_KEY")?;
                Ok::<_, ConfigError>(SecretString::from(key))
            })
            .transpose()?;
        let request_timeout = parse_timeout(
            "CRM_REQUEST_TIMEOUT_SECS",
            &get_env_or_default("CRM_REQUEST_TIMEOUT_SECS", "30"),
        )?;

        Ok(Self {
            url,
            api_key,
            request_timeout,
        })
    }
}

impl CacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let ttl = get_optional_env("CRM_CACHE_TTL_SECS")
            .map(|s| parse_u64("CRM_CACHE_TTL_SECS", &s).map(Duration::from_secs))
            .transpose()?
            .unwrap_or(defaults.ttl);
        let capacity = get_optional_env("CRM_CACHE_CAPACITY")
            .map(|s| parse_u64("CRM_CACHE_CAPACITY", &s))
            .transpose()?
            .unwrap_or(defaults.capacity);
        Ok(Self { ttl, capacity })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an absolute `http`/`https` URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a timeout in seconds; zero disables it.
fn parse_timeout(key: &str, value: &str) -> Result<Option<Duration>, ConfigError> {
    let secs = parse_u64(key, value)?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

/// Reject obvious placeholder values copied from a sample `.env`.
fn reject_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
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

    fn config(base_url: &str) -> PortalConfig {
        PortalConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3002,
            base_url: Url::parse(base_url).unwrap(),
            backend: BackendConfig {
                url: Url::parse("http://localhost:4943").unwrap(),
                api_key: Some(SecretString::from("k3y-9f8a7b6c5d4e")),
                request_timeout: Some(Duration::from_secs(30)),
            },
            identity: IdentityConfig {
                url: Url::parse(DEFAULT_IDENTITY_URL).unwrap(),
            },
            cache: CacheConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
            log_json: false,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config(DEFAULT_BASE_URL).socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3002);
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        assert!(!config("http://localhost:3002").secure_cookies());
        assert!(config("https://crm.vrhomesinfra.in").secure_cookies());
    }

    #[test]
    fn test_backend_config_debug_redacts_api_key() {
        let debug_output = format!("{:?}", config(DEFAULT_BASE_URL).backend);
        assert!(debug_output.contains("localhost:4943"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k3y-9f8a7b6c5d4e"));
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        assert!(parse_url("X", "https://identity.ic0.app").is_ok());
        assert!(matches!(
            parse_url("X", "ftp://example.com"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_url("X", "not a url").is_err());
    }

    #[test]
    fn test_parse_timeout_zero_disables() {
        assert_eq!(parse_timeout("T", "0").unwrap(), None);
        assert_eq!(
            parse_timeout("T", "15").unwrap(),
            Some(Duration::from_secs(15))
        );
        assert!(parse_timeout("T", "-1").is_err());
    }

    #[test]
    fn test_reject_placeholder() {
        assert!(reject_placeholder("your-api-key", "K").is_err());
        assert!(reject_placeholder("CHANGEME", "K").is_err());
        assert!(reject_placeholder("b7f1c2d9e0a4", "K").is_ok());
    }

    #[test]
    fn test_cache_defaults() {
        let cache = CacheConfig::default();
        assert_eq!(cache.ttl, Duration::from_secs(300));
        assert_eq!(cache.capacity, 10_000);
    }
}
