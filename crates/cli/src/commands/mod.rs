//! Subcommand implementations.
//!
//! Each command computes its output as a `String`; `main` prints it.

pub mod check;
pub mod filter;
pub mod inject;

use std::path::{Path, PathBuf};

use cspguard_core::ShieldSettings;
use cspguard_server::csp::PolicyLoadError;
use cspguard_server::settings::{self, EnvSettingsStore, SettingsError, SettingsStore};
use thiserror::Error;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Policy(#[from] PolicyLoadError),
}

/// Settings from `path` if given, otherwise from the `CSPGUARD_*` variables.
///
/// # Errors
///
/// Returns an error if the settings cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> Result<ShieldSettings, CliError> {
    let settings = match path {
        Some(path) => settings::read_settings_file(path)?,
        None => EnvSettingsStore.load()?,
    };
    tracing::debug!(?settings, "Loaded settings");
    Ok(settings)
}
