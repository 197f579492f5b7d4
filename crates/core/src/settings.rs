//! Per-request feature settings.
//!
//! These values come from an external configuration store. The core only
//! reads them; a missing or unreadable store maps to [`ShieldSettings::default`],
//! which disables every optional feature.

use serde::{Deserialize, Serialize};

/// Third-party host blocking configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConfig {
    /// Whether blocked hosts are removed from fetch policies.
    pub block_third_party: bool,
    /// Wildcard host patterns, in configured order.
    pub patterns: Vec<String>,
}

impl BlockConfig {
    /// Build from the newline-delimited pattern list used by the config store.
    ///
    /// Lines are trimmed and blank lines dropped. When blocking is disabled the
    /// pattern list is left empty.
    ///
    /// ```
    /// use cspguard_core::BlockConfig;
    ///
    /// let cfg = BlockConfig::from_pattern_list(true, "*.evil.com\n\n  ads.*  \n");
    /// assert_eq!(cfg.patterns, ["*.evil.com", "ads.*"]);
    ///
    /// let off = BlockConfig::from_pattern_list(false, "*.evil.com");
    /// assert!(off.patterns.is_empty());
    /// ```
    #[must_use]
    pub fn from_pattern_list(enabled: bool, raw: &str) -> Self {
        if !enabled {
            return Self::default();
        }

        Self {
            block_third_party: true,
            patterns: parse_pattern_list(raw),
        }
    }

    /// Returns true if blocking is on and there is at least one pattern.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.block_third_party && !self.patterns.is_empty()
    }
}

/// Split a newline-delimited pattern list, trimming lines and dropping blanks.
#[must_use]
pub fn parse_pattern_list(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Flags that decide whether a request goes through the nonce pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFlags {
    /// Master switch for nonce injection.
    pub enabled: bool,
    /// Skip REST API requests (`/rest/`, `/V1/`).
    pub exclude_rest_api: bool,
    /// Skip admin and customer token endpoints.
    pub exclude_admin_token: bool,
}

/// Everything the pipeline reads from configuration for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldSettings {
    pub gate: GateFlags,
    pub block: BlockConfig,
}
