//! Tests for `GET /rest/V1/csp/policies`.

use std::sync::Arc;

use cspguard_core::{FetchPolicy, Nonce, ShieldSettings};
use cspguard_integration_tests::{ALL_ON, TestContext};
use serde_json::json;

fn fixed_nonce() -> Nonce {
    Nonce::new("fixed")
}

fn policies() -> Vec<FetchPolicy> {
    vec![
        FetchPolicy::builder("script-src")
            .allow_self(true)
            .allow_eval(true)
            .build(),
    ]
}

#[tokio::test]
async fn test_rest_request_excluded_from_nonce() {
    let settings = ShieldSettings {
        gate: ALL_ON,
        ..ShieldSettings::default()
    };
    let ctx = TestContext::with_nonce_source(settings, policies(), Arc::new(fixed_nonce));
    let response = ctx.get("/rest/V1/csp/policies").await;

    assert!(response.status.is_success());
    assert_eq!(response.json()[0]["nonces"], json!([]));
    assert_eq!(response.json()[0]["eval"], json!(false));
    assert_eq!(response.csp(), Some("script-src 'self'"));
}

#[tokio::test]
async fn test_listed_policies_match_header() {
    let settings = ShieldSettings {
        gate: cspguard_core::GateFlags {
            exclude_rest_api: false,
            ..ALL_ON
        },
        ..ShieldSettings::default()
    };
    let ctx = TestContext::with_nonce_source(settings, policies(), Arc::new(fixed_nonce));
    let response = ctx.get("/rest/V1/csp/policies").await;

    let listed: Vec<FetchPolicy> =
        serde_json::from_str(&response.body).expect("policy records");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].nonce_values(), ["fixed"]);
    assert_eq!(
        response.csp(),
        Some(listed[0].to_string().as_str())
    );
    assert_eq!(response.csp(), Some("script-src 'self' 'nonce-fixed'"));
}
