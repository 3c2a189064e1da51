//! GitHub-flavored markdown renderer.
//!
//! Converts journal notes to HTML: strips YAML frontmatter, renders GFM
//! (tables, strikethrough, task lists, hard breaks on single newlines),
//! turns `> [!NOTE]`-style blockquotes into styled callouts, and syntax-
//! highlights fenced code blocks.

use super::highlight;
use crate::error::Result;
use pulldown_cmark::{CodeBlockKind, Event as MdEvent, Options, Parser, Tag, TagEnd, html};

/// Markdown-to-HTML renderer for notes and books.
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a renderer with GFM features enabled.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }

    /// Render markdown to HTML.
    ///
    /// A leading frontmatter block is excluded from the output. Callout
    /// blockquotes become styled admonitions; everything else follows the
    /// GFM transform.
    pub fn render(&self, markdown: &str) -> Result<String> {
        if markdown.is_empty() {
            return Ok(String::new());
        }

        let body = strip_frontmatter(markdown);
        let source = expand_callouts(body, self.options);
        let events = self.transform(Parser::new_ext(&source, self.options));

        let mut out = String::with_capacity(source.len() * 2);
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }

    /// Normalize relative image paths in rendered HTML so images resolve
    /// regardless of the page's directory depth. Absolute URLs are left
    /// untouched. Never fails; unparseable tags pass through unchanged.
    pub fn fix_image_paths(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut remainder = html;
        while let Some(start) = remainder.find("<img") {
            let (before, tag_on) = remainder.split_at(start);
            out.push_str(before);
            let end = tag_on.find('>').map(|i| i + 1).unwrap_or(tag_on.len());
            let (tag, after) = tag_on.split_at(end);
            out.push_str(&rewrite_img_tag(tag));
            remainder = after;
        }
        out.push_str(remainder);
        out
    }

    /// Promote soft breaks to hard breaks and replace code blocks with
    /// highlighted HTML.
    fn transform<'a>(&self, parser: Parser<'a>) -> Vec<MdEvent<'a>> {
        let mut events = Vec::new();
        let mut code = String::new();
        let mut language: Option<String> = None;
        let mut in_code_block = false;

        for event in parser {
            match event {
                MdEvent::SoftBreak => events.push(MdEvent::HardBreak),
                MdEvent::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code.clear();
                    language = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                        _ => None,
                    };
                }
                MdEvent::Text(text) if in_code_block => code.push_str(&text),
                MdEvent::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    events.push(MdEvent::Html(
                        render_code_block(&code, language.as_deref()).into(),
                    ));
                }
                other => events.push(other),
            }
        }
        events
    }
}

/// Strip a leading `---`-delimited YAML frontmatter block. The content
/// runs from the second `---` to the end of the document.
fn strip_frontmatter(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("---") else {
        return text;
    };
    match rest.split_once("---") {
        Some((_frontmatter, body)) => body.trim(),
        None => text,
    }
}

/// Replace `> [!TAG]` blockquote groups with raw callout HTML blocks,
/// leaving all other lines untouched.
fn expand_callouts(text: &str, options: Options) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.lines().peekable();
    let mut in_fence = false;

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }
        let tag = if in_fence { None } else { callout_tag(line) };
        let Some(tag) = tag else {
            out.push_str(line);
            out.push('\n');
            continue;
        };

        let mut body_lines = Vec::new();
        while let Some(next) = lines.peek() {
            let Some(rest) = next.trim_start().strip_prefix('>') else {
                break;
            };
            body_lines.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            lines.next();
        }

        // the callout becomes its own raw HTML block
        if !(out.is_empty() || out.ends_with("\n\n")) {
            out.push('\n');
        }
        let body = body_lines.join("\n");
        out.push_str(&render_callout(tag, body.trim(), options));
        out.push('\n');
    }
    out
}

/// Recognize a `> [!TAG]` marker line and return the tag.
fn callout_tag(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('>')?.trim_start();
    let rest = rest.strip_prefix("[!")?;
    let (tag, after) = rest.split_once(']')?;
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !after.trim().is_empty() {
        return None;
    }
    Some(tag)
}

struct CalloutStyle {
    icon: &'static str,
    class: &'static str,
    label: &'static str,
}

/// Unrecognized tags fall back to Note styling.
fn callout_style(tag: &str) -> CalloutStyle {
    match tag.to_ascii_uppercase().as_str() {
        "TIP" => CalloutStyle {
            icon: "\u{1f4a1}",
            class: "tip",
            label: "Tip",
        },
        "IMPORTANT" => CalloutStyle {
            icon: "\u{2757}",
            class: "important",
            label: "Important",
        },
        "WARNING" => CalloutStyle {
            icon: "\u{26a0}\u{fe0f}",
            class: "warning",
            label: "Warning",
        },
        "CAUTION" => CalloutStyle {
            icon: "\u{1f525}",
            class: "caution",
            label: "Caution",
        },
        _ => CalloutStyle {
            icon: "\u{2139}\u{fe0f}",
            class: "note",
            label: "Note",
        },
    }
}

fn render_callout(tag: &str, body: &str, options: Options) -> String {
    let style = callout_style(tag);
    let content = render_inline(body, options);
    format!(
        "<div class=\"markdown-callout markdown-callout-{}\">\n\
         <div class=\"markdown-callout-header\"><span class=\"markdown-callout-icon\">{}</span><span class=\"markdown-callout-title\">{}</span></div>\n\
         <div class=\"markdown-callout-content\">{}</div>\n\
         </div>\n",
        style.class, style.icon, style.label, content
    )
}

/// Render callout body text as inline markdown, unwrapping a single
/// enclosing paragraph.
fn render_inline(text: &str, options: Options) -> String {
    let mut rendered = String::new();
    html::push_html(&mut rendered, Parser::new_ext(text, options));
    let trimmed = rendered.trim();
    if let Some(inner) = trimmed
        .strip_prefix("<p>")
        .and_then(|s| s.strip_suffix("</p>"))
    {
        if !inner.contains("<p>") {
            return inner.to_string();
        }
    }
    trimmed.to_string()
}

fn render_code_block(code: &str, language: Option<&str>) -> String {
    if let Some(lang) = language {
        if let Some(highlighted) = highlight::highlight(code, lang) {
            return highlighted;
        }
        return format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            highlight::escape_html(lang),
            highlight::escape_html(code)
        );
    }
    format!(
        "<pre><code>{}</code></pre>\n",
        highlight::escape_html(code)
    )
}

fn rewrite_img_tag(tag: &str) -> String {
    let Some(attr) = tag.find("src=\"") else {
        return tag.to_string();
    };
    let value_start = attr + "src=\"".len();
    let Some(value_len) = tag[value_start..].find('"') else {
        return tag.to_string();
    };
    let src = &tag[value_start..value_start + value_len];
    format!(
        "{}{}{}",
        &tag[..value_start],
        normalize_image_path(src),
        &tag[value_start + value_len..]
    )
}

fn normalize_image_path(src: &str) -> String {
    if src.is_empty() || src.starts_with("http") {
        return src.to_string();
    }
    let src = src.trim_start_matches('/');
    if let Some(rest) = src.strip_prefix("../") {
        format!("./{rest}")
    } else if src.starts_with("./") {
        src.to_string()
    } else {
        format!("./{src}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(markdown: &str) -> String {
        MarkdownRenderer::new().render(markdown).unwrap()
    }

    #[test]
    fn test_plain_heading() {
        assert!(render("# Title").contains("<h1>Title</h1>"));
    }

    #[test]
    fn test_empty_input_renders_empty() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_frontmatter_is_stripped() {
        let html = render("---\ntitle: Entry\ntags: [risk]\n---\nBody text");
        assert!(html.contains("Body text"));
        assert!(!html.contains("title: Entry"));
        assert!(!html.contains("risk"));
    }

    #[test]
    fn test_document_without_frontmatter_is_untouched() {
        let html = render("First --- second");
        assert!(html.contains("First --- second"));
    }

    #[test]
    fn test_warning_callout() {
        let html = render("> [!WARNING]\n> Danger ahead");
        assert!(html.contains("markdown-callout-warning"));
        assert!(html.contains("Warning"));
        assert!(html.contains("Danger ahead"));
        assert!(html.contains("\u{26a0}\u{fe0f}"));
    }

    #[test]
    fn test_unrecognized_callout_tag_falls_back_to_note() {
        let html = render("> [!BANANA]\n> Some text");
        assert!(html.contains("markdown-callout-note"));
        assert!(html.contains("Note"));
        assert!(html.contains("Some text"));
    }

    #[test]
    fn test_callout_body_renders_inline_markdown() {
        let html = render("> [!TIP]\n> Use **limit** orders");
        assert!(html.contains("<strong>limit</strong>"));
    }

    #[test]
    fn test_callout_marker_inside_code_fence_is_left_alone() {
        let html = render("```text\n> [!NOTE]\n> not a callout\n```");
        assert!(!html.contains("markdown-callout"));
    }

    #[test]
    fn test_plain_blockquote_stays_a_blockquote() {
        let html = render("> just a quote");
        assert!(html.contains("<blockquote>"));
        assert!(!html.contains("markdown-callout"));
    }

    #[test]
    fn test_single_newline_becomes_hard_break() {
        let html = render("line one\nline two");
        assert!(html.contains("<br"));
    }

    #[test]
    fn test_gfm_table() {
        let html = render("| a | b |\n| --- | --- |\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_gfm_strikethrough_and_tasklist() {
        let html = render("~~scratch~~\n\n- [x] reviewed");
        assert!(html.contains("<del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_code_block_with_unknown_language_is_escaped_verbatim() {
        let html = render("```nolang\na < b\n```");
        assert!(html.contains("a &lt; b"));
        assert!(html.contains("language-nolang"));
    }

    #[test]
    fn test_code_block_with_known_language_is_highlighted() {
        let html = render("```rust\nlet x = 1;\n```");
        assert!(html.contains("<pre"));
        assert!(html.contains('x'));
    }

    #[test]
    fn test_fix_image_paths() {
        let renderer = MarkdownRenderer::new();
        let html = concat!(
            "<img src=\"/assets/img/a.png\">",
            "<img src=\"../shots/b.png\">",
            "<img src=\"c.png\">",
            "<img src=\"http://example.com/d.png\">",
        );
        let fixed = renderer.fix_image_paths(html);
        assert!(fixed.contains("src=\"./assets/img/a.png\""));
        assert!(fixed.contains("src=\"./shots/b.png\""));
        assert!(fixed.contains("src=\"./c.png\""));
        assert!(fixed.contains("src=\"http://example.com/d.png\""));
    }

    #[test]
    fn test_fix_image_paths_ignores_other_tags() {
        let renderer = MarkdownRenderer::new();
        let html = "<a href=\"/page\">link</a>";
        assert_eq!(renderer.fix_image_paths(html), html);
    }
}
