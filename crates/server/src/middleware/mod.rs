//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span)
//! 4. Security headers (static headers)
//! 5. CSP (nonce, policy headers, body rewrite)

pub mod csp;
pub mod request_id;
pub mod security_headers;

pub use csp::{CONTENT_SECURITY_POLICY_REPORT_ONLY, CspNonce, csp_middleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
