//! CSP middleware: script nonces and filtered policy headers.
//!
//! For every request:
//! 1. Load the feature settings (once per request, disabled on failure).
//! 2. Ask the request gate whether the request is excluded. If not, draw one
//!    nonce and store it in request extensions as [`CspNonce`].
//! 3. Run the handler.
//! 4. Collect and filter the policies, register the nonce with the enforced
//!    `script-src`, then set the `Content-Security-Policy` (and
//!    `-Report-Only`) headers.
//! 5. For HTML responses with a nonce, add it to every `<script>` tag in the
//!    body that does not already carry one.
//!
//! Policy filtering runs even for excluded requests: unsafe-source removal does
//! not depend on the feature settings.

use std::borrow::Cow;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{CONTENT_LENGTH, CONTENT_SECURITY_POLICY, CONTENT_TYPE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use cspguard_core::{CspHeaders, Nonce, RequestContext, gate, header, inject};
use futures::{StreamExt, stream};
use http_body_util::BodyExt;

use crate::csp;
use crate::settings;
use crate::state::AppState;

/// `Content-Security-Policy-Report-Only` header name.
pub const CONTENT_SECURITY_POLICY_REPORT_ONLY: &str = "content-security-policy-report-only";

/// Used when the rendered policy cannot be encoded as a header value.
const FALLBACK_POLICY: &str = "default-src 'self'";

/// The response nonce for the current request.
///
/// `None` when the request gate excluded the request; templates then render
/// script tags without a nonce.
#[derive(Clone, Debug)]
pub struct CspNonce(pub Option<Nonce>);

impl CspNonce {
    /// Get the nonce value for use in templates (empty when excluded).
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.as_ref().map_or("", Nonce::as_str)
    }
}

/// Middleware that runs the nonce and policy pipeline.
///
/// Must be the innermost layer so that it sees the handler's raw body.
pub async fn csp_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let settings = settings::load_or_default(state.settings());

    let path = request.uri().path().to_owned();
    let uri = request
        .uri()
        .path_and_query()
        .map_or_else(|| path.clone(), |pq| pq.as_str().to_owned());

    let nonce = match gate::evaluate(&RequestContext::new(&uri, &path), &settings.gate) {
        Some(reason) => {
            tracing::debug!(%reason, path = %path, "Request excluded from script nonces");
            None
        }
        None => Some(state.nonce_source().next_nonce()),
    };

    request.extensions_mut().insert(CspNonce(nonce.clone()));
    request.extensions_mut().insert(settings.clone());

    let mut response = next.run(request).await;

    let policies = csp::response_policies(&state, &settings, nonce.as_ref());
    apply_policy_headers(response.headers_mut(), &header::render(&policies));

    match nonce {
        Some(nonce) if is_html(response.headers()) => {
            inject_body(response, &nonce, state.config().max_body_bytes).await
        }
        _ => response,
    }
}

/// Set or clear the CSP headers from rendered policies.
fn apply_policy_headers(headers: &mut HeaderMap, rendered: &CspHeaders) {
    match &rendered.enforced {
        Some(value) => {
            let value = HeaderValue::from_str(value).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Rendered CSP is not a valid header value, using fallback");
                HeaderValue::from_static(FALLBACK_POLICY)
            });
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        None => {
            headers.remove(CONTENT_SECURITY_POLICY);
        }
    }

    match rendered
        .report_only
        .as_deref()
        .map(HeaderValue::from_str)
    {
        Some(Ok(value)) => {
            headers.insert(CONTENT_SECURITY_POLICY_REPORT_ONLY, value);
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "Rendered report-only CSP is not a valid header value");
            headers.remove(CONTENT_SECURITY_POLICY_REPORT_ONLY);
        }
        None => {
            headers.remove(CONTENT_SECURITY_POLICY_REPORT_ONLY);
        }
    }
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
}

/// Buffer an HTML body and add the nonce to its script tags.
///
/// The body is passed through untouched when it is too large, not UTF-8, or has
/// nothing to rewrite. Page content is never dropped.
async fn inject_body(response: Response, nonce: &Nonce, max_body_bytes: usize) -> Response {
    let declared = declared_length(&response);
    if declared.is_some_and(|len| len > max_body_bytes) {
        tracing::debug!(?declared, max_body_bytes, "HTML body too large for nonce injection");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match buffer_body(body, max_body_bytes).await {
        Buffered::Complete(bytes) => bytes,
        Buffered::Passthrough(body) => return Response::from_parts(parts, body),
    };

    let rewritten = match std::str::from_utf8(&bytes) {
        Ok(html) => match inject::inject(html, nonce) {
            Cow::Owned(rewritten) => Some(rewritten),
            Cow::Borrowed(_) => None,
        },
        Err(_) => {
            tracing::debug!("HTML body is not UTF-8, skipping nonce injection");
            None
        }
    };

    match rewritten {
        Some(html) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(html))
        }
        None => Response::from_parts(parts, Body::from(bytes)),
    }
}

/// Outcome of buffering a response body.
enum Buffered {
    /// The whole body, within the limit.
    Complete(Bytes),
    /// The body to send unmodified: the bytes read so far followed by the
    /// unread remainder.
    Passthrough(Body),
}

/// Read `body` frame by frame up to `limit` bytes.
///
/// Trailers are not forwarded.
async fn buffer_body(mut body: Body, limit: usize) -> Buffered {
    let mut buffered = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    read = buffered.len(),
                    "HTML body stream failed, passing through what was read"
                );
                return Buffered::Passthrough(Body::from(buffered));
            }
        };

        let Ok(data) = frame.into_data() else {
            continue;
        };
        buffered.extend_from_slice(&data);

        if buffered.len() > limit {
            tracing::debug!(limit, "Streamed HTML body too large for nonce injection");
            let head = stream::once(async move { Ok::<_, axum::Error>(Bytes::from(buffered)) });
            return Buffered::Passthrough(Body::from_stream(head.chain(body.into_data_stream())));
        }
    }

    Buffered::Complete(Bytes::from(buffered))
}

/// Body length from `Content-Length` or an exact body size hint.
fn declared_length(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .or_else(|| {
            response
                .body()
                .size_hint()
                .exact()
                .and_then(|len| usize::try_from(len).ok())
        })
}

/// Extractor to get the CSP nonce from request extensions.
///
/// # Example
///
/// ```ignore
/// async fn handler(nonce: CspNonce) -> impl IntoResponse {
///     let renderer = SecureHtmlRenderer::new(nonce.0.as_ref());
///     /* ... */
/// }
/// ```
impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!(
                "CSP nonce not found in request extensions - middleware may be misconfigured"
            );
            Self(None)
        }))
    }
}
