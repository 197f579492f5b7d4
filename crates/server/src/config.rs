//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CSPGUARD_HOST` - Bind address (default: 127.0.0.1)
//! - `CSPGUARD_PORT` - Listen port (default: 3000)
//! - `CSPGUARD_POLICY_FILE` - YAML list of fetch policies (default: built-in strict set)
//! - `CSPGUARD_SETTINGS_FILE` - YAML feature settings, re-read after the TTL expires.
//!   When unset, feature flags are read from the environment on every request
//!   (see [`crate::settings::EnvSettingsStore`]).
//! - `CSPGUARD_SETTINGS_TTL_SECS` - Settings file cache TTL (default: 30)
//! - `CSPGUARD_MAX_BODY_BYTES` - Largest HTML body rewritten (default: 8 MiB)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
const DEFAULT_SETTINGS_TTL_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// YAML file with the fetch policies to serve
    pub policy_file: Option<PathBuf>,
    /// YAML file with feature settings
    pub settings_file: Option<PathBuf>,
    /// How long a loaded settings file is reused
    pub settings_ttl: Duration,
    /// Responses with a larger declared body are not rewritten
    pub max_body_bytes: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            policy_file: None,
            settings_file: None,
            settings_ttl: Duration::from_secs(DEFAULT_SETTINGS_TTL_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            host: parse_or(&lookup, "CSPGUARD_HOST", defaults.host)?,
            port: parse_or(&lookup, "CSPGUARD_PORT", defaults.port)?,
            policy_file: lookup("CSPGUARD_POLICY_FILE").map(PathBuf::from),
            settings_file: lookup("CSPGUARD_SETTINGS_FILE").map(PathBuf::from),
            settings_ttl: Duration::from_secs(parse_or(
                &lookup,
                "CSPGUARD_SETTINGS_TTL_SECS",
                DEFAULT_SETTINGS_TTL_SECS,
            )?),
            max_body_bytes: parse_or(&lookup, "CSPGUARD_MAX_BODY_BYTES", defaults.max_body_bytes)?,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or(&lookup, "SENTRY_SAMPLE_RATE", defaults.sentry_sample_rate)?,
            sentry_traces_sample_rate: parse_or(
                &lookup,
                "SENTRY_TRACES_SAMPLE_RATE",
                defaults.sentry_traces_sample_rate,
            )?,
        })
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

/// Parse a variable if set, otherwise return `default`.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Parse a boolean feature flag (`1`, `true`, `yes`, `on`; case-insensitive).
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for values that are neither truthy nor
/// falsy (`0`, `false`, `no`, `off`, empty).
pub fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean flag, got '{other}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.policy_file.is_none());
        assert!(config.settings_file.is_none());
        assert_eq!(config.settings_ttl, Duration::from_secs(30));
        assert_eq!(config.max_body_bytes, 8 * 1024 * 1024);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CSPGUARD_HOST", "0.0.0.0"),
            ("CSPGUARD_PORT", "8080"),
            ("CSPGUARD_POLICY_FILE", "/etc/cspguard/policies.yaml"),
            ("CSPGUARD_SETTINGS_TTL_SECS", "5"),
            ("SENTRY_DSN", ""),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(
            config.policy_file,
            Some(PathBuf::from("/etc/cspguard/policies.yaml"))
        );
        assert_eq!(config.settings_ttl, Duration::from_secs(5));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[("CSPGUARD_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CSPGUARD_PORT"));
    }

    #[test]
    fn test_parse_flag() {
        for truthy in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(parse_flag("X", truthy).unwrap(), "{truthy}");
        }
        for falsy in ["", "0", "false", "No", "off"] {
            assert!(!parse_flag("X", falsy).unwrap(), "{falsy}");
        }
        assert!(parse_flag("X", "maybe").is_err());
    }
}
