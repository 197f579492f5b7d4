//! Integration tests for cspguard.
//!
//! Tests drive the real router from `cspguard_server::app` in-process with
//! `tower::ServiceExt::oneshot`; no sockets, no environment.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cspguard-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode, header::CONTENT_SECURITY_POLICY},
};
use cspguard_core::{FetchPolicy, GateFlags, NonceSource, ShieldSettings, StaticPolicyCollector};
use cspguard_server::{
    app,
    config::ServerConfig,
    csp::{RandomNonceSource, collector::parse_policies_yaml, default_policies},
    middleware::CONTENT_SECURITY_POLICY_REPORT_ONLY,
    settings::StaticSettingsStore,
    state::AppState,
};
use tower::ServiceExt;

/// Gate flags with every switch on.
pub const ALL_ON: GateFlags = GateFlags {
    enabled: true,
    exclude_rest_api: true,
    exclude_admin_token: true,
};

/// A router configuration under test.
pub struct TestContext {
    state: AppState,
}

impl TestContext {
    /// Built-in policies and random nonces.
    #[must_use]
    pub fn new(settings: ShieldSettings) -> Self {
        Self::with_policies(settings, default_policies())
    }

    /// Policies parsed from an inline YAML fixture.
    ///
    /// # Panics
    ///
    /// Panics if the fixture is invalid.
    #[must_use]
    pub fn with_yaml(settings: ShieldSettings, yaml: &str) -> Self {
        let policies = parse_policies_yaml(yaml).expect("invalid policy fixture");
        Self::with_policies(settings, policies)
    }

    #[must_use]
    pub fn with_policies(settings: ShieldSettings, policies: Vec<FetchPolicy>) -> Self {
        Self::with_nonce_source(settings, policies, Arc::new(RandomNonceSource))
    }

    #[must_use]
    pub fn with_nonce_source(
        settings: ShieldSettings,
        policies: Vec<FetchPolicy>,
        nonce_source: Arc<dyn NonceSource>,
    ) -> Self {
        Self {
            state: AppState::new(
                ServerConfig::default(),
                Arc::new(StaticSettingsStore(settings)),
                Arc::new(StaticPolicyCollector::new(policies)),
                nonce_source,
            ),
        }
    }

    /// Send a `GET` request through the full middleware stack.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not UTF-8.
    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("invalid request");

        let response = app(self.state.clone())
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body read failed");

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).expect("body is not UTF-8"),
        }
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The enforced `Content-Security-Policy` value.
    #[must_use]
    pub fn csp(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_SECURITY_POLICY)
            .and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn csp_report_only(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_SECURITY_POLICY_REPORT_ONLY)
            .and_then(|v| v.to_str().ok())
    }

    /// The nonce registered in the enforced `script-src` directive.
    #[must_use]
    pub fn header_nonce(&self) -> Option<&str> {
        let (_, rest) = self.csp()?.split_once("'nonce-")?;
        rest.split_once('\'').map(|(nonce, _)| nonce)
    }

    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("body is not JSON")
    }
}
