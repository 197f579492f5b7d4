//! Script nonce injection.
//!
//! Adds `nonce="..."` to `<script>` opening tags. Tags that already declare a
//! nonce are left byte-for-byte unchanged, which makes injection idempotent.
//!
//! ```
//! use cspguard_core::{Nonce, inject};
//!
//! let nonce = Nonce::new("abc123");
//! let html = r#"<script type="module" src="/app.js"></script><script nonce="x"></script>"#;
//!
//! let out = inject::inject(html, &nonce);
//! assert_eq!(
//!     out,
//!     r#"<script nonce="abc123" type="module" src="/app.js"></script><script nonce="x"></script>"#
//! );
//! assert_eq!(inject::inject(&out, &nonce), out);
//! ```

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::nonce::Nonce;

/// Opening `<script` tag: tag name, then attributes up to the first `>`.
static SCRIPT_OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(<script)\b([^>]*)>").expect("Invalid regex"));

/// A `nonce` attribute, with optional whitespace before `=`.
static NONCE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnonce\s*=").expect("Invalid regex"));

/// Add `nonce` to every script tag in `html` that does not already carry one.
///
/// Returns the input unchanged (borrowed) when there is nothing to rewrite.
#[must_use]
pub fn inject<'a>(html: &'a str, nonce: &Nonce) -> Cow<'a, str> {
    rewrite(html, nonce, 0)
}

/// Add `nonce` to the first script tag in `html` only.
///
/// Intended for callers that render one tag at a time; pair it with
/// [`has_nonce_attribute`] on the rendered tag. A first tag that already
/// declares a nonce is left alone and later tags are not touched.
#[must_use]
pub fn inject_first<'a>(html: &'a str, nonce: &Nonce) -> Cow<'a, str> {
    rewrite(html, nonce, 1)
}

/// Returns true if `fragment` contains a `nonce=` attribute anywhere.
#[must_use]
pub fn has_nonce_attribute(fragment: &str) -> bool {
    NONCE_ATTR_RE.is_match(fragment)
}

/// Returns true if `html` contains a `<script` opening tag.
#[must_use]
pub fn contains_script_tag(html: &str) -> bool {
    SCRIPT_OPEN_TAG_RE.is_match(html)
}

/// `limit == 0` rewrites every tag.
fn rewrite<'a>(html: &'a str, nonce: &Nonce, limit: usize) -> Cow<'a, str> {
    if !contains_script_tag(html) {
        return Cow::Borrowed(html);
    }

    let rewritten = SCRIPT_OPEN_TAG_RE.replacen(html, limit, |caps: &Captures<'_>| {
        rewrite_tag(caps, nonce)
    });

    // replacen always allocates once a closure ran; hand back the original
    // when every tag was already nonced.
    match rewritten {
        Cow::Owned(ref s) if s == html => Cow::Borrowed(html),
        other => other,
    }
}

fn rewrite_tag(caps: &Captures<'_>, nonce: &Nonce) -> String {
    let whole = caps.get(0).map_or("", |m| m.as_str());
    let tag = caps.get(1).map_or("<script", |m| m.as_str());
    let attributes = caps.get(2).map_or("", |m| m.as_str());

    if has_nonce_attribute(attributes) {
        return whole.to_owned();
    }

    let attributes = attributes.trim();
    if attributes.is_empty() {
        format!(r#"{tag} nonce="{nonce}">"#)
    } else {
        format!(r#"{tag} nonce="{nonce}" {attributes}>"#)
    }
}
