//! Home page route handler.

use askama::Template;
use axum::response::Html;
use serde::Serialize;
use tracing::instrument;

use crate::csp::SecureHtmlRenderer;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;

/// Client-side configuration embedded as a JSON script.
#[derive(Debug, Serialize)]
struct PageConfig {
    app: &'static str,
    nonce_protected: bool,
}

/// Home page template.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Serialized [`PageConfig`].
    pub page_config: String,
    /// Analytics loader, rendered with the nonce already attached.
    pub analytics_script: String,
}

/// Display the home page.
///
/// The inline scripts in the template are nonce-tagged by the CSP middleware's
/// body pass; the analytics loader is tagged here at render time.
#[instrument(skip_all)]
pub async fn home(nonce: CspNonce) -> Result<Html<String>> {
    let renderer = SecureHtmlRenderer::new(nonce.0.as_ref());

    let page_config = serde_json::to_string(&PageConfig {
        app: "cspguard",
        nonce_protected: nonce.0.is_some(),
    })
    .map_err(|e| AppError::Internal(format!("failed to serialize page config: {e}")))?;

    let template = HomeTemplate {
        page_config,
        analytics_script: renderer.render_tag(
            "script",
            &[("src", "/static/analytics.js"), ("defer", "defer")],
            None,
        ),
    };

    Ok(Html(template.render()?))
}
