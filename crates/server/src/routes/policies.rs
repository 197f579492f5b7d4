//! Policy inspection endpoint.
//!
//! Returns the exact policy records the CSP middleware serializes for this
//! request, after nonce registration and filtering.

use axum::{Extension, Json, extract::State};
use cspguard_core::{FetchPolicy, ShieldSettings};
use tracing::instrument;

use crate::csp;
use crate::middleware::CspNonce;
use crate::state::AppState;

#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    Extension(settings): Extension<ShieldSettings>,
    nonce: CspNonce,
) -> Json<Vec<FetchPolicy>> {
    let policies = csp::response_policies(&state, &settings, nonce.0.as_ref());
    tracing::debug!(count = policies.len(), "Listing response policies");
    Json(policies)
}
