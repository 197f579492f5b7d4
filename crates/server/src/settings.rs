//! Feature settings stores.
//!
//! Settings are read once per request through a [`SettingsStore`]. A store that
//! fails to load is treated as "everything disabled" by [`load_or_default`];
//! unsafe-source removal does not depend on settings and keeps running.
//!
//! ## YAML Format
//!
//! ```yaml
//! enabled: true
//! exclude_rest_api: true
//! exclude_admin_token: true
//! block_third_party_domains: true
//! blocked_domains: |
//!   *.doubleclick.net
//!   ads.*
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cspguard_core::{BlockConfig, GateFlags, ShieldSettings};
use moka::sync::Cache;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{ConfigError, parse_flag};

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error(transparent)]
    Env(#[from] ConfigError),
    #[error(transparent)]
    Cached(Arc<SettingsError>),
}

/// Source of per-request feature settings.
pub trait SettingsStore: Send + Sync {
    /// Load the current settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the backing store cannot be read or parsed.
    fn load(&self) -> Result<ShieldSettings, SettingsError>;
}

/// Load settings, falling back to all-disabled defaults on failure.
pub fn load_or_default(store: &dyn SettingsStore) -> ShieldSettings {
    store.load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load CSP settings, using disabled defaults");
        ShieldSettings::default()
    })
}

/// Settings file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    enabled: bool,
    exclude_rest_api: bool,
    exclude_admin_token: bool,
    block_third_party_domains: bool,
    /// Newline-delimited wildcard patterns.
    blocked_domains: String,
}

impl From<SettingsFile> for ShieldSettings {
    fn from(file: SettingsFile) -> Self {
        Self {
            gate: GateFlags {
                enabled: file.enabled,
                exclude_rest_api: file.exclude_rest_api,
                exclude_admin_token: file.exclude_admin_token,
            },
            block: BlockConfig::from_pattern_list(
                file.block_third_party_domains,
                &file.blocked_domains,
            ),
        }
    }
}

/// Parse settings from YAML text.
///
/// # Errors
///
/// Returns `SettingsError::Parse` if the YAML is malformed.
pub fn parse_settings_yaml(yaml: &str) -> Result<ShieldSettings, SettingsError> {
    if yaml.trim().is_empty() {
        return Ok(ShieldSettings::default());
    }
    let file: SettingsFile = serde_yaml::from_str(yaml)?;
    Ok(file.into())
}

/// Read and parse a settings file.
///
/// # Errors
///
/// Returns `SettingsError` if the file cannot be read or parsed.
pub fn read_settings_file(path: &Path) -> Result<ShieldSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings_yaml(&content)
}

// =============================================================================
// Stores
// =============================================================================

/// Fixed settings, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsStore(pub ShieldSettings);

impl SettingsStore for StaticSettingsStore {
    fn load(&self) -> Result<ShieldSettings, SettingsError> {
        Ok(self.0.clone())
    }
}

/// Reads the `CSPGUARD_*` flags from the environment on every load.
///
/// - `CSPGUARD_ENABLED`
/// - `CSPGUARD_EXCLUDE_REST_API`
/// - `CSPGUARD_EXCLUDE_ADMIN_TOKEN`
/// - `CSPGUARD_BLOCK_THIRD_PARTY`
/// - `CSPGUARD_BLOCKED_DOMAINS` (newline-delimited)
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettingsStore;

impl EnvSettingsStore {
    /// Build settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Env` if a flag has an unrecognized value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ShieldSettings, SettingsError> {
        let flag = |key: &str| -> Result<bool, ConfigError> {
            lookup(key).map_or(Ok(false), |value| parse_flag(key, &value))
        };

        Ok(ShieldSettings {
            gate: GateFlags {
                enabled: flag("CSPGUARD_ENABLED")?,
                exclude_rest_api: flag("CSPGUARD_EXCLUDE_REST_API")?,
                exclude_admin_token: flag("CSPGUARD_EXCLUDE_ADMIN_TOKEN")?,
            },
            block: BlockConfig::from_pattern_list(
                flag("CSPGUARD_BLOCK_THIRD_PARTY")?,
                &lookup("CSPGUARD_BLOCKED_DOMAINS").unwrap_or_default(),
            ),
        })
    }
}

impl SettingsStore for EnvSettingsStore {
    fn load(&self) -> Result<ShieldSettings, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Reads a YAML settings file, reusing the parsed result until the TTL expires.
#[derive(Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
    cache: Cache<(), ShieldSettings>,
}

impl FileSettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for FileSettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSettingsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<ShieldSettings, SettingsError> {
        self.cache
            .try_get_with((), || {
                tracing::debug!(path = %self.path.display(), "Reloading CSP settings file");
                read_settings_file(&self.path)
            })
            .map_err(SettingsError::Cached)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_parse_settings_yaml() {
        let yaml = r"
enabled: true
exclude_rest_api: true
block_third_party_domains: true
blocked_domains: |
  *.doubleclick.net

  ads.*
";
        let settings = parse_settings_yaml(yaml).unwrap();
        assert!(settings.gate.enabled);
        assert!(settings.gate.exclude_rest_api);
        assert!(!settings.gate.exclude_admin_token);
        assert!(settings.block.block_third_party);
        assert_eq!(settings.block.patterns, ["*.doubleclick.net", "ads.*"]);
    }

    #[test]
    fn test_patterns_ignored_when_blocking_off() {
        let yaml = "enabled: true\nblocked_domains: \"*.evil.com\"\n";
        let settings = parse_settings_yaml(yaml).unwrap();
        assert!(!settings.block.block_third_party);
        assert!(settings.block.patterns.is_empty());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(parse_settings_yaml("").unwrap(), ShieldSettings::default());
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        assert!(matches!(
            parse_settings_yaml("enabled: [not, a, bool]"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_env_store_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CSPGUARD_ENABLED", "true"),
            ("CSPGUARD_EXCLUDE_ADMIN_TOKEN", "1"),
            ("CSPGUARD_BLOCK_THIRD_PARTY", "yes"),
            ("CSPGUARD_BLOCKED_DOMAINS", "*.evil.com\n \nads.*"),
        ]);
        let settings =
            EnvSettingsStore::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();

        assert!(settings.gate.enabled);
        assert!(!settings.gate.exclude_rest_api);
        assert!(settings.gate.exclude_admin_token);
        assert_eq!(settings.block.patterns, ["*.evil.com", "ads.*"]);
    }

    #[test]
    fn test_env_store_rejects_bad_flag() {
        let result = EnvSettingsStore::from_lookup(|key| {
            (key == "CSPGUARD_ENABLED").then(|| "perhaps".to_string())
        });
        assert!(matches!(result, Err(SettingsError::Env(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let store = FileSettingsStore::new(
            "/nonexistent/cspguard/settings.yaml",
            Duration::from_secs(30),
        );
        assert!(matches!(store.load(), Err(SettingsError::Cached(_))));
        assert_eq!(load_or_default(&store), ShieldSettings::default());
    }

    #[test]
    fn test_file_store_reads_and_caches() {
        let path = std::env::temp_dir().join(format!(
            "cspguard-settings-{}.yaml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "enabled: true\n").unwrap();

        let store = FileSettingsStore::new(&path, Duration::from_secs(300));
        assert!(store.load().unwrap().gate.enabled);

        // Within the TTL the cached value is served even after the file changes.
        std::fs::write(&path, "enabled: false\n").unwrap();
        assert!(store.load().unwrap().gate.enabled);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_static_store() {
        let settings = ShieldSettings {
            gate: GateFlags {
                enabled: true,
                ..GateFlags::default()
            },
            ..ShieldSettings::default()
        };
        let store = StaticSettingsStore(settings.clone());
        assert_eq!(store.load().unwrap(), settings);
    }
}
