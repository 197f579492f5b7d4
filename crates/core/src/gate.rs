//! Request gate: decides whether a request skips the nonce pipeline.
//!
//! Matching is plain substring search over the path and the full URI. `/V1/`
//! anywhere in either string counts as a REST request; keep it that way, the
//! deployed exclusion lists depend on it.

use core::fmt;

use crate::settings::GateFlags;

const REST_API_MARKERS: &[&str] = &["/rest/", "/V1/"];
const TOKEN_ENDPOINT_MARKERS: &[&str] = &["/integration/admin/token", "/integration/customer/token"];

/// The parts of a request the gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext<'a> {
    /// Full request URI including the query string.
    pub request_uri: &'a str,
    /// Path portion of the URI.
    pub path_info: &'a str,
}

impl<'a> RequestContext<'a> {
    #[must_use]
    pub const fn new(request_uri: &'a str, path_info: &'a str) -> Self {
        Self {
            request_uri,
            path_info,
        }
    }

    fn contains_any(&self, markers: &[&str]) -> bool {
        markers
            .iter()
            .any(|m| self.path_info.contains(m) || self.request_uri.contains(m))
    }
}

/// Why a request was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// The module is switched off.
    Disabled,
    /// REST API request.
    RestApi,
    /// Admin or customer token endpoint.
    TokenEndpoint,
}

impl Exclusion {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::RestApi => "rest_api",
            Self::TokenEndpoint => "token_endpoint",
        }
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the reason `ctx` is excluded, or `None` if the pipeline applies.
#[must_use]
pub fn evaluate(ctx: &RequestContext<'_>, flags: &GateFlags) -> Option<Exclusion> {
    if !flags.enabled {
        return Some(Exclusion::Disabled);
    }

    if flags.exclude_rest_api && ctx.contains_any(REST_API_MARKERS) {
        return Some(Exclusion::RestApi);
    }

    if flags.exclude_admin_token && ctx.contains_any(TOKEN_ENDPOINT_MARKERS) {
        return Some(Exclusion::TokenEndpoint);
    }

    None
}

/// Returns true if the pipeline should be skipped for `ctx`.
#[must_use]
pub fn should_exclude(ctx: &RequestContext<'_>, flags: &GateFlags) -> bool {
    evaluate(ctx, flags).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ON: GateFlags = GateFlags {
        enabled: true,
        exclude_rest_api: true,
        exclude_admin_token: true,
    };

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext::new(path, path)
    }

    #[test]
    fn test_disabled_module_excludes_everything() {
        let flags = GateFlags::default();
        assert_eq!(evaluate(&ctx("/"), &flags), Some(Exclusion::Disabled));
        assert!(should_exclude(&ctx("/checkout"), &flags));
    }

    #[test]
    fn test_rest_path_excluded_when_enabled() {
        assert_eq!(
            evaluate(&ctx("/rest/V1/products"), &ALL_ON),
            Some(Exclusion::RestApi)
        );
    }

    #[test]
    fn test_rest_path_included_when_rest_exclusion_off() {
        let flags = GateFlags {
            enabled: true,
            exclude_rest_api: false,
            exclude_admin_token: false,
        };
        assert!(!should_exclude(&ctx("/rest/V1/products"), &flags));
    }

    #[test]
    fn test_v1_anywhere_is_rest() {
        assert!(should_exclude(&ctx("/catalog/V1/shoes.html"), &ALL_ON));
        assert!(should_exclude(
            &RequestContext::new("/search?q=/V1/", "/search"),
            &ALL_ON
        ));
    }

    #[test]
    fn test_rest_marker_is_case_sensitive() {
        assert!(!should_exclude(&ctx("/REST/v1/products"), &ALL_ON));
    }

    #[test]
    fn test_token_endpoints() {
        for path in [
            "/rest/default/V1/integration/admin/token",
            "/integration/customer/token",
            "/index.php/integration/admin/token",
        ] {
            let flags = GateFlags {
                enabled: true,
                exclude_rest_api: false,
                exclude_admin_token: true,
            };
            assert_eq!(
                evaluate(&ctx(path), &flags),
                Some(Exclusion::TokenEndpoint),
                "{path}"
            );
        }
    }

    #[test]
    fn test_token_endpoint_included_when_flag_off() {
        let flags = GateFlags {
            enabled: true,
            exclude_rest_api: false,
            exclude_admin_token: false,
        };
        assert!(!should_exclude(&ctx("/integration/admin/token"), &flags));
    }

    #[test]
    fn test_rest_checked_before_token() {
        assert_eq!(
            evaluate(&ctx("/rest/V1/integration/admin/token"), &ALL_ON),
            Some(Exclusion::RestApi)
        );
    }

    #[test]
    fn test_uri_only_match() {
        let request = RequestContext::new("/index.php/rest/default/schema", "/index.php");
        assert!(should_exclude(&request, &ALL_ON));
    }

    #[test]
    fn test_regular_pages_included() {
        for path in ["/", "/products/shoe", "/customer/account/login"] {
            assert!(!should_exclude(&ctx(path), &ALL_ON), "{path}");
        }
    }
}
