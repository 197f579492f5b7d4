//! Compiled blocklist cache.
//!
//! Settings are loaded per request, but the pattern list rarely changes.
//! Compiled blocklists are cached by their pattern list so each distinct list
//! is compiled once.

use std::sync::Arc;

use cspguard_core::{BlockConfig, DomainBlocklist};
use moka::sync::Cache;

/// Distinct pattern lists kept compiled at once.
const MAX_CACHED_BLOCKLISTS: u64 = 16;

/// Cache of compiled blocklists keyed by pattern list.
#[derive(Clone)]
pub struct BlocklistCache {
    cache: Cache<Vec<String>, Arc<DomainBlocklist>>,
}

impl Default for BlocklistCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BlocklistCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::new(MAX_CACHED_BLOCKLISTS),
        }
    }

    /// Compiled blocklist for `cfg`, or `None` when blocking is disabled.
    #[must_use]
    pub fn get(&self, cfg: &BlockConfig) -> Option<Arc<DomainBlocklist>> {
        if !cfg.block_third_party {
            return None;
        }

        Some(self.cache.get_with(cfg.patterns.clone(), || {
            tracing::debug!(patterns = cfg.patterns.len(), "Compiling domain blocklist");
            Arc::new(DomainBlocklist::new(&cfg.patterns))
        }))
    }
}

impl std::fmt::Debug for BlocklistCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlocklistCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(enabled: bool, raw: &str) -> BlockConfig {
        BlockConfig::from_pattern_list(enabled, raw)
    }

    #[test]
    fn test_disabled_returns_none() {
        let cache = BlocklistCache::new();
        assert!(cache.get(&cfg(false, "*.evil.com")).is_none());
    }

    #[test]
    fn test_same_patterns_share_compiled_blocklist() {
        let cache = BlocklistCache::new();
        let first = cache.get(&cfg(true, "*.evil.com\nads.*"));
        let second = cache.get(&cfg(true, "  *.evil.com\n\nads.*  "));

        match (first, second) {
            (Some(a), Some(b)) => {
                assert!(Arc::ptr_eq(&a, &b));
                assert!(a.is_blocked("cdn.evil.com"));
            }
            other => panic!("expected cached blocklists, got {other:?}"),
        }
    }

    #[test]
    fn test_enabled_without_patterns_blocks_nothing() {
        let cache = BlocklistCache::new();
        let blocklist = cache.get(&cfg(true, "\n"));
        assert!(blocklist.is_some_and(|b| b.is_empty() && !b.is_blocked("x.com")));
    }
}
