//! Syntax highlighting for fenced code blocks.

use once_cell::sync::Lazy;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME: Lazy<Theme> = Lazy::new(|| {
    ThemeSet::load_defaults()
        .themes
        .get("base16-ocean.dark")
        .cloned()
        .unwrap_or_default()
});

/// Highlight a code block for the declared language.
///
/// Returns `None` for unknown languages or highlighter failures; the
/// caller emits the raw code instead.
pub fn highlight(code: &str, language: &str) -> Option<String> {
    let syntax = SYNTAX_SET.find_syntax_by_token(language)?;
    match highlighted_html_for_string(code, &SYNTAX_SET, syntax, &THEME) {
        Ok(html) => Some(html),
        Err(error) => {
            tracing::warn!(language, %error, "syntax highlighting failed");
            None
        }
    }
}

/// Minimal HTML escaping for raw code output.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
