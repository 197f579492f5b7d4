//! Wildcard host matching for the third-party domain blocklist.
//!
//! Patterns are literal host strings where `*` stands for any run of
//! characters (including none). Everything else, `.` included, matches
//! literally. Matching is anchored to the whole host and case-insensitive.
//!
//! ```
//! use cspguard_core::domain;
//!
//! assert!(domain::matches("sub.evil.com", "*.evil.com"));
//! assert!(!domain::matches("evil.com", "*.evil.com"));
//! assert!(domain::matches("anything", "*"));
//! ```

use regex::{Regex, RegexBuilder};

/// A single compiled blocklist pattern.
#[derive(Debug, Clone)]
pub struct DomainPattern {
    raw: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Wildcard(Regex),
    /// Used when the regex engine refuses the compiled pattern.
    Literal,
}

impl DomainPattern {
    /// Compile a wildcard pattern. Never fails.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let source = format!("^(?:{})$", wildcard_to_regex(pattern));
        let matcher = match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(regex) => Matcher::Wildcard(regex),
            Err(e) => {
                tracing::warn!(
                    pattern,
                    error = %e,
                    "Blocked domain pattern could not be compiled, matching literally"
                );
                Matcher::Literal
            }
        };

        Self {
            raw: pattern.to_owned(),
            matcher,
        }
    }

    /// The pattern as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `host` matches this pattern.
    #[must_use]
    pub fn matches(&self, host: &str) -> bool {
        match &self.matcher {
            Matcher::Wildcard(regex) => regex.is_match(host),
            Matcher::Literal => host.eq_ignore_ascii_case(&self.raw),
        }
    }
}

/// An ordered list of compiled patterns.
///
/// Compile once per configuration and reuse it for every host check.
#[derive(Debug, Clone, Default)]
pub struct DomainBlocklist {
    patterns: Vec<DomainPattern>,
}

impl DomainBlocklist {
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| DomainPattern::new(p.as_ref()))
                .collect(),
        }
    }

    /// Returns true if any pattern matches `host`.
    #[must_use]
    pub fn is_blocked(&self, host: &str) -> bool {
        self.first_match(host).is_some()
    }

    /// Returns the first pattern that matches `host`.
    #[must_use]
    pub fn first_match(&self, host: &str) -> Option<&DomainPattern> {
        self.patterns.iter().find(|p| p.matches(host))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

/// Returns true if `host` matches the wildcard `pattern`.
#[must_use]
pub fn matches(host: &str, pattern: &str) -> bool {
    DomainPattern::new(pattern).matches(host)
}

/// Returns true if `host` matches any of `patterns`. An empty list never blocks.
#[must_use]
pub fn is_blocked<S: AsRef<str>>(host: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches(host, p.as_ref()))
}

/// Translate a wildcard pattern into an (unanchored) regex body.
fn wildcard_to_regex(pattern: &str) -> String {
    pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}
