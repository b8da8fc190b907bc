//! Minimal line-oriented Markdown renderer
//!
//! Used when no Markdown converter is available. It understands headings
//! (`#` to `##########`), bullet lists and paragraphs. Everything else,
//! including inline emphasis, links and code, is emitted as escaped text.

use lazy_static::lazy_static;
use regex::Regex;

/// Deepest heading level HTML provides
pub const MAX_NATIVE_HEADING: usize = 6;

/// Deepest heading level recognised in content
pub const MAX_HEADING_DEPTH: usize = 10;

lazy_static! {
    static ref HEADING_RE: Regex = Regex::new(r"^(#{1,10})\s+(.+)$").unwrap();
    static ref BULLET_RE: Regex = Regex::new(r"^[-*+]\s+(.*)$").unwrap();
}

/// Render a heading whose text is already escaped.
///
/// Depths past [`MAX_NATIVE_HEADING`] become `<h6>` with the intended depth
/// kept in `data-level`.
pub(crate) fn heading_html(depth: usize, escaped_text: &str) -> String {
    if depth > MAX_NATIVE_HEADING {
        format!(
            r#"<h{native} data-level="{depth}">{escaped_text}</h{native}>"#,
            native = MAX_NATIVE_HEADING
        )
    } else {
        format!("<h{depth}>{escaped_text}</h{depth}>")
    }
}

/// Render `markdown` with the minimal rules
pub fn render(markdown: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut list_items: Vec<String> = Vec::new();

    for line in markdown.lines() {
        let line = line.trim();

        if let Some(caps) = BULLET_RE.captures(line) {
            list_items.push(format!(
                "<li>{}</li>",
                html_escape::encode_text(caps[1].trim())
            ));
            continue;
        }

        if !list_items.is_empty() {
            blocks.push(close_list(&mut list_items));
        }

        if line.is_empty() {
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            let depth = caps[1].len();
            let text = html_escape::encode_text(caps[2].trim());
            blocks.push(heading_html(depth, &text));
        } else {
            blocks.push(format!("<p>{}</p>", html_escape::encode_text(line)));
        }
    }

    if !list_items.is_empty() {
        blocks.push(close_list(&mut list_items));
    }

    blocks.join("\n")
}

fn close_list(items: &mut Vec<String>) -> String {
    let html = format!("<ul>\n{}\n</ul>", items.join("\n"));
    items.clear();
    html
}
