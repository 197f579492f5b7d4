//! Tag rendering for templates.
//!
//! Handlers that emit script tags from code (rather than template markup)
//! render them here. Script tags get the response nonce at render time, one tag
//! at a time, using the same rewrite as the whole-body pass.

use cspguard_core::{Nonce, inject};

/// Renders HTML tags, attaching the response nonce to script tags.
#[derive(Debug, Clone, Copy)]
pub struct SecureHtmlRenderer<'a> {
    nonce: Option<&'a Nonce>,
}

impl<'a> SecureHtmlRenderer<'a> {
    /// `nonce` is `None` when the request was excluded from the pipeline.
    #[must_use]
    pub const fn new(nonce: Option<&'a Nonce>) -> Self {
        Self { nonce }
    }

    /// Render `<tag attrs>content</tag>`.
    ///
    /// Attribute values are HTML-escaped. `content` is written as-is; script
    /// bodies are not HTML. With no content a void tag (`<tag attrs/>`) is
    /// rendered, except for `script`, which always needs a closing tag.
    #[must_use]
    pub fn render_tag(&self, tag: &str, attributes: &[(&str, &str)], content: Option<&str>) -> String {
        let is_script = tag.eq_ignore_ascii_case("script");

        let attrs: String = attributes
            .iter()
            .map(|(name, value)| format!(r#" {name}="{}""#, escape_attribute(value)))
            .collect();

        let html = match content {
            Some(content) => format!("<{tag}{attrs}>{content}</{tag}>"),
            None if is_script => format!("<{tag}{attrs}></{tag}>"),
            None => format!("<{tag}{attrs}/>"),
        };

        match self.nonce {
            Some(nonce) if is_script && !inject::has_nonce_attribute(&opening_tag(&html)) => {
                inject::inject_first(&html, nonce).into_owned()
            }
            _ => html,
        }
    }

    /// Render an inline script.
    #[must_use]
    pub fn script(&self, attributes: &[(&str, &str)], body: &str) -> String {
        self.render_tag("script", attributes, Some(body))
    }
}

/// The opening tag of a rendered element; the nonce check must not look at
/// script bodies.
fn opening_tag(html: &str) -> String {
    html.split_inclusive('>').next().unwrap_or(html).to_owned()
}

fn escape_attribute(value: &str) -> impl std::fmt::Display + '_ {
    let Ok(escaped) = askama::filters::escape(value, askama::filters::Html);
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_gets_nonce() {
        let nonce = Nonce::new("abc");
        let renderer = SecureHtmlRenderer::new(Some(&nonce));
        let html = renderer.script(&[("type", "module")], "init()");
        assert_eq!(html, r#"<script nonce="abc" type="module">init()</script>"#);
    }

    #[test]
    fn test_script_with_declared_nonce_untouched() {
        let nonce = Nonce::new("abc");
        let renderer = SecureHtmlRenderer::new(Some(&nonce));
        let html = renderer.script(&[("nonce", "preset")], "x()");
        assert_eq!(html, r#"<script nonce="preset">x()</script>"#);
    }

    #[test]
    fn test_nonce_text_in_body_does_not_count() {
        let nonce = Nonce::new("abc");
        let renderer = SecureHtmlRenderer::new(Some(&nonce));
        let html = renderer.script(&[], "const nonce = 1;");
        assert_eq!(html, r#"<script nonce="abc">const nonce = 1;</script>"#);
    }

    #[test]
    fn test_excluded_request_renders_plain() {
        let renderer = SecureHtmlRenderer::new(None);
        let html = renderer.script(&[("src", "/app.js")], "");
        assert_eq!(html, r#"<script src="/app.js"></script>"#);
    }

    #[test]
    fn test_non_script_tags_untouched() {
        let nonce = Nonce::new("abc");
        let renderer = SecureHtmlRenderer::new(Some(&nonce));
        let html = renderer.render_tag("link", &[("rel", "stylesheet"), ("href", "/a.css")], None);
        assert_eq!(html, r#"<link rel="stylesheet" href="/a.css"/>"#);
    }

    #[test]
    fn test_script_without_content_gets_closing_tag() {
        let nonce = Nonce::new("abc");
        let renderer = SecureHtmlRenderer::new(Some(&nonce));
        let html = renderer.render_tag("script", &[("src", "/a.js")], None);
        assert_eq!(html, r#"<script nonce="abc" src="/a.js"></script>"#);
    }

    #[test]
    fn test_attribute_values_escaped() {
        let renderer = SecureHtmlRenderer::new(None);
        let html = renderer.render_tag("div", &[("title", r#"a "b" <c> & d"#)], Some(""));
        assert_eq!(
            html,
            r#"<div title="a &#34;b&#34; &#60;c&#62; &#38; d"></div>"#
        );
    }
}
