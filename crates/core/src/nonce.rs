//! Nonce values and the capability that produces them.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A per-response CSP nonce in its final encoded form (usually base64).
///
/// The value is treated as opaque and inserted verbatim into markup and
/// headers, so sources must not produce quotes or angle brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Supplies fresh nonces. Called at most once per response.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> Nonce;
}

impl<F> NonceSource for F
where
    F: Fn() -> Nonce + Send + Sync,
{
    fn next_nonce(&self) -> Nonce {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_nonce_source() {
        let source = || Nonce::new("fixed");
        assert_eq!(source.next_nonce().as_str(), "fixed");
    }

    #[test]
    fn test_display_is_verbatim() {
        assert_eq!(Nonce::new("a+b/c==").to_string(), "a+b/c==");
    }
}
