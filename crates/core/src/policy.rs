//! Fetch-policy records.
//!
//! A [`FetchPolicy`] describes one CSP fetch directive (`script-src`,
//! `img-src`, ...) as structured data. Records are immutable: every change goes
//! through a consuming `with_*` constructor that returns a new record with all
//! other fields carried over.

use core::fmt;

use serde::{Deserialize, Serialize};

/// One CSP fetch directive and its allowed sources.
///
/// ## Examples
///
/// ```
/// use cspguard_core::FetchPolicy;
///
/// let policy = FetchPolicy::builder("script-src")
///     .allow_self(true)
///     .host("cdn.shop.com")
///     .allow_eval(true)
///     .build();
///
/// assert_eq!(policy.value(), "'self' 'unsafe-eval' cdn.shop.com");
///
/// let safe = policy.without_unsafe();
/// assert_eq!(safe.to_string(), "script-src 'self' cdn.shop.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FetchPolicyDef")]
pub struct FetchPolicy {
    id: String,
    report_only: bool,
    #[serde(rename = "hosts")]
    host_sources: Vec<String>,
    #[serde(rename = "schemes")]
    scheme_sources: Vec<String>,
    #[serde(rename = "self")]
    self_allowed: bool,
    #[serde(rename = "inline")]
    inline_allowed: bool,
    #[serde(rename = "eval")]
    eval_allowed: bool,
    #[serde(rename = "nonces")]
    nonce_values: Vec<String>,
    hashes: Vec<String>,
    #[serde(rename = "dynamic")]
    dynamic_allowed: bool,
    event_handlers_allowed: bool,
}

impl FetchPolicy {
    /// Start building a policy for the given directive name.
    pub fn builder(id: impl Into<String>) -> FetchPolicyBuilder {
        FetchPolicyBuilder::new(id)
    }

    /// Directive name, e.g. `script-src`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn is_report_only(&self) -> bool {
        self.report_only
    }

    #[must_use]
    pub fn host_sources(&self) -> &[String] {
        &self.host_sources
    }

    /// Scheme sources without the trailing `:`.
    #[must_use]
    pub fn scheme_sources(&self) -> &[String] {
        &self.scheme_sources
    }

    #[must_use]
    pub const fn is_self_allowed(&self) -> bool {
        self.self_allowed
    }

    #[must_use]
    pub const fn is_inline_allowed(&self) -> bool {
        self.inline_allowed
    }

    #[must_use]
    pub const fn is_eval_allowed(&self) -> bool {
        self.eval_allowed
    }

    #[must_use]
    pub fn nonce_values(&self) -> &[String] {
        &self.nonce_values
    }

    /// Hash sources in `<algorithm>-<base64>` form.
    #[must_use]
    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    #[must_use]
    pub const fn is_dynamic_allowed(&self) -> bool {
        self.dynamic_allowed
    }

    #[must_use]
    pub const fn is_event_handlers_allowed(&self) -> bool {
        self.event_handlers_allowed
    }

    /// Returns true if the policy permits `'unsafe-inline'` or `'unsafe-eval'`.
    #[must_use]
    pub const fn has_unsafe(&self) -> bool {
        self.inline_allowed || self.eval_allowed
    }

    /// Replace the host-source set, keeping every other field.
    #[must_use]
    pub fn with_host_sources<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_sources = Vec::new();
        for host in hosts {
            push_unique(&mut self.host_sources, host.into());
        }
        self
    }

    /// Drop `'unsafe-inline'` and `'unsafe-eval'`.
    ///
    /// The resulting policy is always enforced (`report_only` is cleared) so a
    /// stripped policy cannot silently fall back to report-only mode.
    #[must_use]
    pub fn without_unsafe(mut self) -> Self {
        self.report_only = false;
        self.inline_allowed = false;
        self.eval_allowed = false;
        self
    }

    /// Add a nonce value (base64, without the `'nonce-` prefix).
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        push_unique(&mut self.nonce_values, nonce.into());
        self
    }

    /// Render the source list of this directive.
    ///
    /// Returns `'none'` when nothing is allowed.
    #[must_use]
    pub fn value(&self) -> String {
        let mut sources: Vec<String> = Vec::new();

        if self.self_allowed {
            sources.push("'self'".to_owned());
        }
        if self.inline_allowed {
            sources.push("'unsafe-inline'".to_owned());
        }
        if self.eval_allowed {
            sources.push("'unsafe-eval'".to_owned());
        }
        if self.dynamic_allowed {
            sources.push("'strict-dynamic'".to_owned());
        }
        if self.event_handlers_allowed {
            sources.push("'unsafe-hashes'".to_owned());
        }
        sources.extend(self.host_sources.iter().cloned());
        sources.extend(self.scheme_sources.iter().map(|s| format!("{s}:")));
        sources.extend(self.nonce_values.iter().map(|n| format!("'nonce-{n}'")));
        sources.extend(self.hashes.iter().map(|h| format!("'{h}'")));

        if sources.is_empty() {
            return "'none'".to_owned();
        }
        sources.join(" ")
    }
}

impl fmt::Display for FetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.value())
    }
}

/// Builder for [`FetchPolicy`].
///
/// Set-valued fields keep insertion order and ignore duplicates.
#[derive(Debug, Clone)]
#[must_use]
pub struct FetchPolicyBuilder {
    policy: FetchPolicy,
}

impl FetchPolicyBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            policy: FetchPolicy {
                id: id.into(),
                report_only: false,
                host_sources: Vec::new(),
                scheme_sources: Vec::new(),
                self_allowed: false,
                inline_allowed: false,
                eval_allowed: false,
                nonce_values: Vec::new(),
                hashes: Vec::new(),
                dynamic_allowed: false,
                event_handlers_allowed: false,
            },
        }
    }

    pub const fn report_only(mut self, report_only: bool) -> Self {
        self.policy.report_only = report_only;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        push_unique(&mut self.policy.host_sources, host.into());
        self
    }

    pub fn hosts<I, S>(self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        hosts.into_iter().fold(self, Self::host)
    }

    /// Add a scheme source. A trailing `:` is stripped (`https:` and `https`
    /// are the same source).
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        let scheme = scheme.into();
        let scheme = scheme.strip_suffix(':').unwrap_or(&scheme).to_owned();
        push_unique(&mut self.policy.scheme_sources, scheme);
        self
    }

    pub fn schemes<I, S>(self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        schemes.into_iter().fold(self, Self::scheme)
    }

    pub const fn allow_self(mut self, allowed: bool) -> Self {
        self.policy.self_allowed = allowed;
        self
    }

    pub const fn allow_inline(mut self, allowed: bool) -> Self {
        self.policy.inline_allowed = allowed;
        self
    }

    pub const fn allow_eval(mut self, allowed: bool) -> Self {
        self.policy.eval_allowed = allowed;
        self
    }

    pub const fn allow_dynamic(mut self, allowed: bool) -> Self {
        self.policy.dynamic_allowed = allowed;
        self
    }

    pub const fn allow_event_handlers(mut self, allowed: bool) -> Self {
        self.policy.event_handlers_allowed = allowed;
        self
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        push_unique(&mut self.policy.nonce_values, nonce.into());
        self
    }

    pub fn nonces<I, S>(self, nonces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        nonces.into_iter().fold(self, Self::nonce)
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        push_unique(&mut self.policy.hashes, hash.into());
        self
    }

    pub fn hashes<I, S>(self, hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        hashes.into_iter().fold(self, Self::hash)
    }

    #[must_use]
    pub fn build(self) -> FetchPolicy {
        self.policy
    }
}

fn push_unique(set: &mut Vec<String>, value: String) {
    if !set.contains(&value) {
        set.push(value);
    }
}

/// Wire form of [`FetchPolicy`]; deserialization goes through the builder so
/// set-valued fields are de-duplicated.
#[derive(Deserialize)]
struct FetchPolicyDef {
    id: String,
    #[serde(default)]
    report_only: bool,
    #[serde(default)]
    hosts: Vec<String>,
    #[serde(default)]
    schemes: Vec<String>,
    #[serde(default, rename = "self")]
    self_allowed: bool,
    #[serde(default)]
    inline: bool,
    #[serde(default)]
    eval: bool,
    #[serde(default)]
    nonces: Vec<String>,
    #[serde(default)]
    hashes: Vec<String>,
    #[serde(default)]
    dynamic: bool,
    #[serde(default)]
    event_handlers_allowed: bool,
}

impl From<FetchPolicyDef> for FetchPolicy {
    fn from(def: FetchPolicyDef) -> Self {
        Self::builder(def.id)
            .report_only(def.report_only)
            .hosts(def.hosts)
            .schemes(def.schemes)
            .allow_self(def.self_allowed)
            .allow_inline(def.inline)
            .allow_eval(def.eval)
            .nonces(def.nonces)
            .hashes(def.hashes)
            .allow_dynamic(def.dynamic)
            .allow_event_handlers(def.event_handlers_allowed)
            .build()
    }
}
