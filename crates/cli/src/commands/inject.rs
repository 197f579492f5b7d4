//! Add a nonce to the script tags of an HTML file.

use std::path::Path;

use cspguard_core::{Nonce, inject};
use cspguard_server::csp::RandomNonceSource;

use super::CliError;

/// Read `path` and return the rewritten HTML.
///
/// Draws a random nonce when `nonce` is `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn run(path: &Path, nonce: Option<String>, first_only: bool) -> Result<String, CliError> {
    let html = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let nonce = nonce.map_or_else(RandomNonceSource::generate, Nonce::new);
    tracing::info!(path = %path.display(), nonce = %nonce, first_only, "Injecting nonce");

    Ok(rewrite(&html, &nonce, first_only))
}

fn rewrite(html: &str, nonce: &Nonce, first_only: bool) -> String {
    if first_only {
        inject::inject_first(html, nonce).into_owned()
    } else {
        inject::inject(html, nonce).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<script>a()</script><SCRIPT src=\"b.js\"></SCRIPT>";

    #[test]
    fn test_rewrite_all_tags() {
        let out = rewrite(PAGE, &Nonce::new("n"), false);
        assert_eq!(
            out,
            r#"<script nonce="n">a()</script><SCRIPT nonce="n" src="b.js"></SCRIPT>"#
        );
    }

    #[test]
    fn test_rewrite_first_only() {
        let out = rewrite(PAGE, &Nonce::new("n"), true);
        assert_eq!(
            out,
            r#"<script nonce="n">a()</script><SCRIPT src="b.js"></SCRIPT>"#
        );
    }
}
