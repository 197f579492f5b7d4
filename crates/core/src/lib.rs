//! cspguard core - CSP policy filtering and script nonce injection.
//!
//! This crate holds the pure parts of cspguard, shared by the server and the CLI:
//! - [`domain`] - Wildcard host blocklist matching
//! - [`filter`] - Unsafe-source removal and blocked-host filtering for fetch policies
//! - [`inject`] - Idempotent `nonce` injection into `<script>` tags
//! - [`gate`] - Per-request decision whether the pipeline applies
//! - [`header`] - Rendering filtered policies into header values
//!
//! # Architecture
//!
//! The core contains only types, traits and pure functions - no I/O, no HTTP,
//! no configuration loading. Nonce generation and policy collection are
//! injected through the [`NonceSource`] and [`PolicyCollector`] traits.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod collector;
pub mod domain;
pub mod filter;
pub mod gate;
pub mod header;
pub mod inject;
pub mod nonce;
pub mod policy;
pub mod settings;

pub use collector::{PolicyCollector, StaticPolicyCollector};
pub use domain::{DomainBlocklist, DomainPattern};
pub use filter::PolicyFilter;
pub use gate::{Exclusion, RequestContext};
pub use header::CspHeaders;
pub use nonce::{Nonce, NonceSource};
pub use policy::{FetchPolicy, FetchPolicyBuilder};
pub use settings::{BlockConfig, GateFlags, ShieldSettings};
