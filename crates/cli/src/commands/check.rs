//! Host blocklist and request gate checks.

use std::path::Path;

use cspguard_core::{DomainBlocklist, GateFlags, RequestContext, gate};

use super::{CliError, load_settings};

/// Report whether `host` matches any of `patterns`.
#[must_use]
pub fn host(host: &str, patterns: &[String]) -> String {
    let blocklist = DomainBlocklist::new(patterns);
    match blocklist.first_match(host) {
        Some(pattern) => format!("blocked (matches {})", pattern.as_str()),
        None => "allowed".to_owned(),
    }
}

/// Report whether the request gate excludes `uri`.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded.
pub fn request(uri: &str, settings_file: Option<&Path>) -> Result<String, CliError> {
    let settings = load_settings(settings_file)?;
    Ok(request_with(uri, &settings.gate))
}

fn request_with(uri: &str, flags: &GateFlags) -> String {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    match gate::evaluate(&RequestContext::new(uri, path), flags) {
        Some(reason) => format!("excluded ({reason})"),
        None => "included".to_owned(),
    }
}
