//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (askama, inline scripts)
//! GET  /health                 - Health check
//! GET  /rest/V1/csp/policies   - Filtered policy records as JSON
//! *                            - 404
//! ```

pub mod home;
pub mod policies;

use axum::{Router, http::Uri, routing::get};

use crate::error::AppError;
use crate::state::AppState;

/// Create the application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/rest/V1/csp/policies", get(policies::list))
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_owned())
}
