//! Header serialization for filtered policy sets.
//!
//! Enforced records go into `Content-Security-Policy`, report-only records into
//! `Content-Security-Policy-Report-Only`. Directives keep their input order.

use crate::nonce::Nonce;
use crate::policy::FetchPolicy;

/// Directive that receives response nonces.
pub const SCRIPT_SRC: &str = "script-src";

/// Rendered header values. `None` means the header should not be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspHeaders {
    pub enforced: Option<String>,
    pub report_only: Option<String>,
}

/// Serialize `policies` into header values.
///
/// ```
/// use cspguard_core::{FetchPolicy, header};
///
/// let headers = header::render(&[
///     FetchPolicy::builder("default-src").allow_self(true).build(),
///     FetchPolicy::builder("img-src").allow_self(true).host("cdn.shop.com").build(),
/// ]);
/// assert_eq!(
///     headers.enforced.as_deref(),
///     Some("default-src 'self'; img-src 'self' cdn.shop.com")
/// );
/// assert!(headers.report_only.is_none());
/// ```
#[must_use]
pub fn render(policies: &[FetchPolicy]) -> CspHeaders {
    let (report_only, enforced): (Vec<&FetchPolicy>, Vec<&FetchPolicy>) =
        policies.iter().partition(|p| p.is_report_only());

    CspHeaders {
        enforced: join(&enforced),
        report_only: join(&report_only),
    }
}

fn join(policies: &[&FetchPolicy]) -> Option<String> {
    if policies.is_empty() {
        return None;
    }
    Some(
        policies
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Register `nonce` with the enforced `script-src` record.
///
/// When no such record exists, a new `script-src` allowing only the nonce is
/// appended.
#[must_use]
pub fn register_nonce(mut policies: Vec<FetchPolicy>, nonce: &Nonce) -> Vec<FetchPolicy> {
    let position = policies
        .iter()
        .position(|p| p.id() == SCRIPT_SRC && !p.is_report_only());

    match position {
        Some(index) => {
            let existing = policies.remove(index);
            policies.insert(index, existing.with_nonce(nonce.as_str()));
        }
        None => policies.push(FetchPolicy::builder(SCRIPT_SRC).nonce(nonce.as_str()).build()),
    }

    policies
}
