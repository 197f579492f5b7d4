//! Fetch-policy filtering.
//!
//! Two rules are applied to every record, in order:
//!
//! 1. Unsafe removal: `'unsafe-inline'` and `'unsafe-eval'` are dropped and the
//!    record is forced to enforce mode.
//! 2. Third-party host filtering: hosts matching the blocklist are removed.
//!    Only runs when blocking is enabled.
//!
//! Filtering never adds or removes records, only rewrites them, so the output
//! has the same length and order as the input.

use crate::domain::DomainBlocklist;
use crate::policy::FetchPolicy;
use crate::settings::BlockConfig;

/// Reusable policy filter.
///
/// ```
/// use cspguard_core::{DomainBlocklist, FetchPolicy, PolicyFilter};
///
/// let blocklist = DomainBlocklist::new(["*.evil.com"]);
/// let filter = PolicyFilter::new(true).with_blocklist(&blocklist);
///
/// let policies = vec![
///     FetchPolicy::builder("script-src")
///         .hosts(["cdn.evil.com", "good.com"])
///         .allow_eval(true)
///         .build(),
/// ];
///
/// let filtered = filter.apply(policies);
/// assert_eq!(filtered[0].host_sources(), ["good.com"]);
/// assert!(!filtered[0].is_eval_allowed());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyFilter<'a> {
    remove_unsafe: bool,
    blocklist: Option<&'a DomainBlocklist>,
}

impl<'a> PolicyFilter<'a> {
    /// Create a filter. Host filtering is off until a blocklist is attached.
    #[must_use]
    pub const fn new(remove_unsafe: bool) -> Self {
        Self {
            remove_unsafe,
            blocklist: None,
        }
    }

    /// Enable host filtering against `blocklist`.
    #[must_use]
    pub const fn with_blocklist(mut self, blocklist: &'a DomainBlocklist) -> Self {
        self.blocklist = Some(blocklist);
        self
    }

    /// Like [`Self::with_blocklist`], but accepts an optional blocklist.
    #[must_use]
    pub const fn with_optional_blocklist(mut self, blocklist: Option<&'a DomainBlocklist>) -> Self {
        self.blocklist = blocklist;
        self
    }

    /// Filter every record, keeping order and length.
    #[must_use]
    pub fn apply(&self, policies: Vec<FetchPolicy>) -> Vec<FetchPolicy> {
        policies.into_iter().map(|p| self.apply_one(p)).collect()
    }

    /// Filter a single record.
    #[must_use]
    pub fn apply_one(&self, policy: FetchPolicy) -> FetchPolicy {
        let policy = if self.remove_unsafe {
            remove_unsafe(policy)
        } else {
            policy
        };

        match self.blocklist {
            Some(blocklist) => remove_blocked_hosts(policy, blocklist),
            None => policy,
        }
    }
}

/// Filter `policies` against `cfg`.
///
/// Host filtering runs only when `cfg.block_third_party` is set. The patterns
/// are compiled for this call; use [`PolicyFilter`] with a shared
/// [`DomainBlocklist`] to compile them once.
#[must_use]
pub fn filter(policies: Vec<FetchPolicy>, cfg: &BlockConfig, remove_unsafe: bool) -> Vec<FetchPolicy> {
    let blocklist = cfg
        .block_third_party
        .then(|| DomainBlocklist::new(&cfg.patterns));

    PolicyFilter::new(remove_unsafe)
        .with_optional_blocklist(blocklist.as_ref())
        .apply(policies)
}

fn remove_unsafe(policy: FetchPolicy) -> FetchPolicy {
    if !policy.has_unsafe() {
        return policy;
    }

    tracing::debug!(
        directive = policy.id(),
        inline = policy.is_inline_allowed(),
        eval = policy.is_eval_allowed(),
        "Removing unsafe sources from policy"
    );
    policy.without_unsafe()
}

fn remove_blocked_hosts(policy: FetchPolicy, blocklist: &DomainBlocklist) -> FetchPolicy {
    let kept: Vec<String> = policy
        .host_sources()
        .iter()
        .filter(|host| !blocklist.is_blocked(host))
        .cloned()
        .collect();

    if kept.len() == policy.host_sources().len() {
        return policy;
    }

    tracing::debug!(
        directive = policy.id(),
        removed = policy.host_sources().len() - kept.len(),
        "Removed blocked hosts from policy"
    );
    policy.with_host_sources(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocking(patterns: &[&str]) -> BlockConfig {
        BlockConfig {
            block_third_party: true,
            patterns: patterns.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    #[test]
    fn test_unsafe_removal_keeps_self_and_hosts() {
        let policy = FetchPolicy::builder("script-src")
            .allow_inline(true)
            .allow_eval(true)
            .allow_self(true)
            .host("a.com")
            .build();

        let out = filter(vec![policy], &BlockConfig::default(), true);

        assert_eq!(out.len(), 1);
        assert!(!out[0].is_inline_allowed());
        assert!(!out[0].is_eval_allowed());
        assert!(out[0].is_self_allowed());
        assert_eq!(out[0].host_sources(), ["a.com"]);
    }

    #[test]
    fn test_unsafe_removal_clears_report_only() {
        let policy = FetchPolicy::builder("script-src")
            .report_only(true)
            .allow_inline(true)
            .build();

        let out = filter(vec![policy], &BlockConfig::default(), true);
        assert!(!out[0].is_report_only());
    }

    #[test]
    fn test_safe_policy_passes_through_unchanged() {
        let policy = FetchPolicy::builder("style-src")
            .report_only(true)
            .allow_self(true)
            .host("fonts.example.com")
            .build();

        let out = filter(vec![policy.clone()], &BlockConfig::default(), true);
        assert_eq!(out, vec![policy]);
    }

    #[test]
    fn test_unsafe_kept_when_removal_disabled() {
        let policy = FetchPolicy::builder("script-src").allow_inline(true).build();
        let out = filter(vec![policy.clone()], &BlockConfig::default(), false);
        assert_eq!(out, vec![policy]);
    }

    #[test]
    fn test_host_filtering_enabled() {
        let policy = FetchPolicy::builder("script-src")
            .hosts(["cdn.evil.com", "good.com"])
            .build();

        let out = filter(vec![policy], &blocking(&["*.evil.com"]), true);
        assert_eq!(out[0].host_sources(), ["good.com"]);
    }

    #[test]
    fn test_host_filtering_disabled() {
        let policy = FetchPolicy::builder("script-src")
            .hosts(["cdn.evil.com", "good.com"])
            .build();
        let cfg = BlockConfig {
            block_third_party: false,
            patterns: vec!["*.evil.com".to_owned()],
        };

        let out = filter(vec![policy], &cfg, true);
        assert_eq!(out[0].host_sources(), ["cdn.evil.com", "good.com"]);
    }

    #[test]
    fn test_host_filtering_keeps_other_fields() {
        let policy = FetchPolicy::builder("img-src")
            .report_only(true)
            .allow_self(true)
            .hosts(["ads.tracker.com", "cdn.shop.com"])
            .scheme("data")
            .nonce("abc")
            .build();

        let out = filter(vec![policy], &blocking(&["ads.*"]), true);

        assert_eq!(out[0].host_sources(), ["cdn.shop.com"]);
        assert!(out[0].is_report_only());
        assert!(out[0].is_self_allowed());
        assert_eq!(out[0].scheme_sources(), ["data"]);
        assert_eq!(out[0].nonce_values(), ["abc"]);
    }

    #[test]
    fn test_filtering_preserves_length_and_order() {
        let policies = vec![
            FetchPolicy::builder("default-src").allow_self(true).build(),
            FetchPolicy::builder("script-src").host("cdn.evil.com").build(),
            FetchPolicy::builder("img-src").allow_inline(true).build(),
        ];

        let out = filter(policies, &blocking(&["*.evil.com"]), true);

        let ids: Vec<&str> = out.iter().map(FetchPolicy::id).collect();
        assert_eq!(ids, ["default-src", "script-src", "img-src"]);
        assert!(out[1].host_sources().is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let policies = vec![
            FetchPolicy::builder("script-src")
                .allow_eval(true)
                .hosts(["ads.tracker.com", "cdn.shop.com"])
                .build(),
        ];
        let cfg = blocking(&["ads.*"]);

        let once = filter(policies, &cfg, true);
        let twice = filter(once.clone(), &cfg, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_end_to_end_ads_pattern() {
        let policy = FetchPolicy::builder("script-src")
            .hosts(["ads.tracker.com", "cdn.shop.com"])
            .allow_eval(true)
            .build();

        let out = filter(vec![policy], &blocking(&["ads.*"]), true);

        assert_eq!(out[0].host_sources(), ["cdn.shop.com"]);
        assert!(!out[0].is_eval_allowed());
    }

    #[test]
    fn test_policy_filter_with_shared_blocklist() {
        let blocklist = DomainBlocklist::new(["*.evil.com"]);
        let filter = PolicyFilter::new(false).with_blocklist(&blocklist);

        let kept = FetchPolicy::builder("connect-src").host("api.good.com").build();
        assert_eq!(filter.apply_one(kept.clone()), kept);

        let trimmed = filter.apply_one(
            FetchPolicy::builder("connect-src")
                .hosts(["api.good.com", "x.evil.com"])
                .allow_inline(true)
                .build(),
        );
        assert_eq!(trimmed.host_sources(), ["api.good.com"]);
        assert!(trimmed.is_inline_allowed());
    }
}
