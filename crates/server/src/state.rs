//! Application state shared across handlers.

use std::sync::Arc;

use cspguard_core::{NonceSource, PolicyCollector};

use crate::config::ServerConfig;
use crate::csp::{self, BlocklistCache, PolicyLoadError, RandomNonceSource};
use crate::settings::{EnvSettingsStore, FileSettingsStore, SettingsStore};

/// Application state shared across all handlers and middleware.
///
/// This struct is cheaply cloneable via `Arc`. The pipeline's external
/// collaborators (settings store, policy collector, nonce source) are held as
/// trait objects so tests and embedders can swap them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    settings: Arc<dyn SettingsStore>,
    collector: Arc<dyn PolicyCollector>,
    nonce_source: Arc<dyn NonceSource>,
    blocklists: BlocklistCache,
}

impl AppState {
    /// Create a new application state from explicit collaborators.
    pub fn new(
        config: ServerConfig,
        settings: Arc<dyn SettingsStore>,
        collector: Arc<dyn PolicyCollector>,
        nonce_source: Arc<dyn NonceSource>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                settings,
                collector,
                nonce_source,
                blocklists: BlocklistCache::new(),
            }),
        }
    }

    /// Create the state described by `config`.
    ///
    /// Uses a [`FileSettingsStore`] when a settings file is configured and the
    /// [`EnvSettingsStore`] otherwise. Policies come from the configured policy
    /// file or the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured policy file cannot be loaded.
    pub fn from_config(config: ServerConfig) -> Result<Self, PolicyLoadError> {
        let collector = csp::load_collector(config.policy_file.as_deref())?;

        let settings: Arc<dyn SettingsStore> = match &config.settings_file {
            Some(path) => {
                tracing::info!(path = %path.display(), "Reading CSP settings from file");
                Arc::new(FileSettingsStore::new(path, config.settings_ttl))
            }
            None => {
                tracing::info!("Reading CSP settings from environment");
                Arc::new(EnvSettingsStore)
            }
        };

        Ok(Self::new(
            config,
            settings,
            Arc::new(collector),
            Arc::new(RandomNonceSource),
        ))
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn settings(&self) -> &dyn SettingsStore {
        self.inner.settings.as_ref()
    }

    #[must_use]
    pub fn collector(&self) -> &dyn PolicyCollector {
        self.inner.collector.as_ref()
    }

    #[must_use]
    pub fn nonce_source(&self) -> &dyn NonceSource {
        self.inner.nonce_source.as_ref()
    }

    #[must_use]
    pub fn blocklists(&self) -> &BlocklistCache {
        &self.inner.blocklists
    }
}
