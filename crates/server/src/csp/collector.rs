//! Policy collection from YAML files and the built-in defaults.
//!
//! ## YAML Format
//!
//! ```yaml
//! - id: default-src
//!   self: true
//! - id: script-src
//!   self: true
//!   hosts:
//!     - cdn.shop.com
//! - id: img-src
//!   self: true
//!   schemes: ["data"]
//!   hosts: ["https://cdn.example.com"]
//! ```

use std::path::{Path, PathBuf};

use cspguard_core::{FetchPolicy, StaticPolicyCollector};
use thiserror::Error;

/// Errors that can occur while loading a policy file.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse policies: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// The strict policy set served when no policy file is configured.
///
/// ```text
/// default-src 'none';
/// script-src 'self';
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' https://cdn.example.com;
/// connect-src 'self';
/// frame-src 'none';
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'none'
/// ```
#[must_use]
pub fn default_policies() -> Vec<FetchPolicy> {
    let self_only = |id: &str| FetchPolicy::builder(id).allow_self(true).build();
    let none = |id: &str| FetchPolicy::builder(id).build();

    vec![
        none("default-src"),
        self_only("script-src"),
        self_only("style-src"),
        self_only("font-src"),
        FetchPolicy::builder("img-src")
            .allow_self(true)
            .host("https://cdn.example.com")
            .build(),
        self_only("connect-src"),
        none("frame-src"),
        none("object-src"),
        self_only("base-uri"),
        self_only("form-action"),
        none("frame-ancestors"),
    ]
}

/// Parse a policy list from YAML text.
///
/// # Errors
///
/// Returns `PolicyLoadError::Parse` if the YAML is malformed.
pub fn parse_policies_yaml(yaml: &str) -> Result<Vec<FetchPolicy>, PolicyLoadError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Read a policy list from a YAML file.
///
/// # Errors
///
/// Returns `PolicyLoadError` if the file cannot be read or parsed.
pub fn read_policy_file(path: &Path) -> Result<Vec<FetchPolicy>, PolicyLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_policies_yaml(&content)
}

/// Build the collector for the configured policy file, or the defaults.
///
/// # Errors
///
/// Returns `PolicyLoadError` if a configured file cannot be loaded.
pub fn load_collector(path: Option<&Path>) -> Result<StaticPolicyCollector, PolicyLoadError> {
    let policies = match path {
        Some(path) => {
            let policies = read_policy_file(path)?;
            tracing::info!(
                path = %path.display(),
                count = policies.len(),
                "Loaded CSP policies"
            );
            policies
        }
        None => default_policies(),
    };
    Ok(StaticPolicyCollector::new(policies))
}
