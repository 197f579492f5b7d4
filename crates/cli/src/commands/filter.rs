//! Filter a policy file and print the resulting header lines.

use std::path::Path;

use cspguard_core::{FetchPolicy, ShieldSettings, filter, header};
use cspguard_server::csp::collector::read_policy_file;

use super::{CliError, load_settings};

/// Load, filter and render the policies in `policy_file`.
///
/// # Errors
///
/// Returns an error if the policy or settings file cannot be loaded.
pub fn run(policy_file: &Path, settings_file: Option<&Path>, keep_unsafe: bool) -> Result<String, CliError> {
    let policies = read_policy_file(policy_file)?;
    let settings = load_settings(settings_file)?;
    tracing::info!(policies = policies.len(), keep_unsafe, "Filtering policies");

    Ok(render(policies, &settings, keep_unsafe))
}

fn render(policies: Vec<FetchPolicy>, settings: &ShieldSettings, keep_unsafe: bool) -> String {
    let filtered = filter::filter(policies, &settings.block, !keep_unsafe);
    let headers = header::render(&filtered);

    let enforced = headers
        .enforced
        .map(|value| format!("Content-Security-Policy: {value}\n"));
    let report_only = headers
        .report_only
        .map(|value| format!("Content-Security-Policy-Report-Only: {value}\n"));

    enforced.into_iter().chain(report_only).collect()
}
