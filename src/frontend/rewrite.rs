//! Base-path rewriting of HTML documents.
//!
//! Every `src=` / `href=` attribute whose value is root-relative or bare gets
//! the configured prefix inserted at the start of the value, replacing a
//! single leading `/`. Values with a scheme (`https://…`) or protocol-relative
//! values (`//cdn…`) are left alone.
//!
//! The rewrite is not idempotent: applying it twice prefixes twice.

use regex::{Captures, Regex};

/// Matches the attribute name, `=`, and the opening quote, then optionally an
/// absolute URL start, then an optional leading slash. Unquoted values only
/// match with whitespace before the name and nothing around `=`, so script
/// assignments such as `el.src = url` are skipped.
const ATTRIBUTE_PATTERN: &str = r#"(?P<lead>(?P<space>^|\s)?(?:src|href)(?: *= *(?P<quote>['"])|=))(?P<absolute>[a-zA-Z][a-zA-Z0-9+.-]*://|//)?(?P<slash>/)?"#;

/// Inserts a base path in front of root-relative asset URLs.
#[derive(Debug, Clone)]
pub struct ContentRewriter {
    base_path: String,
    pattern: Regex,
}

impl ContentRewriter {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            pattern: Regex::new(ATTRIBUTE_PATTERN).expect("attribute pattern compiles"),
        }
    }

    /// Rewrite an HTML body.
    pub fn rewrite(&self, body: &str) -> String {
        self.pattern
            .replace_all(body, |caps: &Captures<'_>| {
                let matched = &caps[0];
                if caps.name("absolute").is_some() {
                    return matched.to_string();
                }
                if caps.name("quote").is_none() {
                    if caps.name("space").is_none() {
                        return matched.to_string();
                    }
                    let end = caps.get(0).map_or(body.len(), |m| m.end());
                    if caps.name("slash").is_none() && !body[end..].starts_with(is_url_char) {
                        return matched.to_string();
                    }
                }
                format!("{}{}", &caps["lead"], self.base_path)
            })
            .into_owned()
    }

    /// Rewrite raw document bytes, decoding them as UTF-8 (invalid sequences
    /// are replaced).
    pub fn rewrite_bytes(&self, body: &[u8]) -> String {
        self.rewrite(&String::from_utf8_lossy(body))
    }
}

/// First character of an unquoted URL value.
fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '~' | '%' | '?' | '#')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> ContentRewriter {
        ContentRewriter::new("/base/")
    }

    #[test]
    fn test_root_relative_src() {
        assert_eq!(
            rewriter().rewrite(r#"<script src="/app.js"></script>"#),
            r#"<script src="/base/app.js"></script>"#
        );
    }

    #[test]
    fn test_scheme_urls_untouched() {
        let input = r#"<a href="https://example.com/x">x</a>"#;
        assert_eq!(rewriter().rewrite(input), input);

        let input = r#"<link href='http://cdn.example.com/a.css'>"#;
        assert_eq!(rewriter().rewrite(input), input);
    }

    #[test]
    fn test_protocol_relative_untouched() {
        let input = r#"<script src="//cdn.example.com/lib.js"></script>"#;
        assert_eq!(rewriter().rewrite(input), input);
    }

    #[test]
    fn test_bare_unquoted_value_gains_prefix() {
        assert_eq!(rewriter().rewrite("<img src=app.png>"), "<img src=/base/app.png>");
    }

    #[test]
    fn test_unquoted_values_in_attribute_position() {
        assert_eq!(
            rewriter().rewrite("<img\nsrc=/a.png alt=x href=b.css>"),
            "<img\nsrc=/base/a.png alt=x href=/base/b.css>"
        );
        assert_eq!(rewriter().rewrite("<a href=//cdn/x>"), "<a href=//cdn/x>");
        assert_eq!(rewriter().rewrite("<a href=>"), "<a href=>");
    }

    #[test]
    fn test_inline_script_assignments_untouched() {
        let input = concat!(
            "<script>var s = document.createElement('script');",
            "s.src = url;a.href=location.origin;img.src=base + name;",
            "</script>",
        );
        assert_eq!(rewriter().rewrite(input), input);
    }

    #[test]
    fn test_bare_quoted_value_and_spacing() {
        assert_eq!(
            rewriter().rewrite(r#"<link href = 'style.css'>"#),
            r#"<link href = '/base/style.css'>"#
        );
    }

    #[test]
    fn test_every_attribute_in_document() {
        let input = concat!(
            r#"<html><head><link rel="icon" href="/favicon.ico">"#,
            r#"<script src="/static/main.js"></script></head>"#,
            r#"<body><a href="https://example.com">ext</a><img src="logo.png"></body></html>"#,
        );
        let expected = concat!(
            r#"<html><head><link rel="icon" href="/base/favicon.ico">"#,
            r#"<script src="/base/static/main.js"></script></head>"#,
            r#"<body><a href="https://example.com">ext</a><img src="/base/logo.png"></body></html>"#,
        );
        assert_eq!(rewriter().rewrite(input), expected);
    }

    #[test]
    fn test_not_idempotent() {
        let once = rewriter().rewrite(r#"<script src="/app.js">"#);
        let twice = rewriter().rewrite(&once);
        assert_eq!(twice, r#"<script src="/base/base/app.js">"#);
    }

    #[test]
    fn test_root_base_path_is_neutral() {
        let input = r#"<script src="/app.js"></script>"#;
        assert_eq!(ContentRewriter::new("/").rewrite(input), input);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let out = rewriter().rewrite_bytes(b"<img src=\"/a.png\">\xff");
        assert_eq!(out, "<img src=\"/base/a.png\">\u{fffd}");
    }
}
