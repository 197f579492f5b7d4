//! cspguard server library.
//!
//! Serves HTML through the CSP pipeline: per-request script nonces, nonce
//! injection into HTML bodies, and filtered `Content-Security-Policy` headers.
//! The router is exposed as a library so integration tests can drive it
//! in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod csp;
pub mod error;
mod filters;
pub mod middleware;
pub mod routes;
pub mod settings;
pub mod state;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are not included; the binary adds them outermost.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .fallback(routes::not_found)
        .layer(from_fn_with_state(state.clone(), middleware::csp_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
