//! CSP collaborators around the core pipeline.
//!
//! - [`nonce_source`] - Random nonce generation
//! - [`collector`] - Policy loading (YAML file or built-in defaults)
//! - [`blocklist`] - Compiled blocklist cache
//! - [`renderer`] - Per-tag rendering with nonce attachment

pub mod blocklist;
pub mod collector;
pub mod nonce_source;
pub mod renderer;

pub use blocklist::BlocklistCache;
pub use collector::{PolicyLoadError, default_policies, load_collector};
pub use nonce_source::RandomNonceSource;
pub use renderer::SecureHtmlRenderer;

use cspguard_core::{FetchPolicy, Nonce, PolicyFilter, ShieldSettings, header};

use crate::state::AppState;

/// The policy records to serialize for one response.
///
/// Collects policies and filters them: unsafe sources are always removed,
/// blocked hosts only when third-party blocking is enabled in `settings`. The
/// nonce (if any) is registered last, with the `script-src` record that is
/// enforced after filtering, so a record moved out of report-only mode by
/// unsafe removal receives it instead of a second `script-src`.
#[must_use]
pub fn response_policies(
    state: &AppState,
    settings: &ShieldSettings,
    nonce: Option<&Nonce>,
) -> Vec<FetchPolicy> {
    let blocklist = state.blocklists().get(&settings.block);
    let policies = PolicyFilter::new(true)
        .with_optional_blocklist(blocklist.as_deref())
        .apply(state.collector().collect());

    match nonce {
        Some(nonce) => header::register_nonce(policies, nonce),
        None => policies,
    }
}
