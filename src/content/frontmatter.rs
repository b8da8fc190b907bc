//! Front-matter parsing

use lazy_static::lazy_static;
use regex::Regex;

/// Marker line opening and closing the metadata block
const MARKER: &str = "---";

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"(?i)^\s*title\s*:(.*)$").unwrap();
}

/// Title and body of a content item after its metadata block is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContent {
    pub title: String,
    pub body: String,
}

/// Front-matter parser
pub struct FrontMatter;

impl FrontMatter {
    /// Split `raw` into a resolved title and the body.
    ///
    /// A metadata block is recognised only when the first line is `---` and a
    /// later line closes it with `---`. If the block carries a `title` key its
    /// value becomes the title and the block (plus any blank lines after it)
    /// is stripped from the body. Otherwise `fallback` is returned together
    /// with `raw` unchanged.
    pub fn parse(raw: &str, fallback: &str) -> ParsedContent {
        match Self::split(raw) {
            Some((block, rest)) => match Self::title_of(block) {
                Some(title) => ParsedContent {
                    title,
                    body: strip_leading_blank_lines(rest).to_string(),
                },
                None => Self::unchanged(raw, fallback),
            },
            None => Self::unchanged(raw, fallback),
        }
    }

    fn unchanged(raw: &str, fallback: &str) -> ParsedContent {
        ParsedContent {
            title: fallback.to_string(),
            body: raw.to_string(),
        }
    }

    /// Returns the text between the markers and everything after the closing one
    fn split(raw: &str) -> Option<(&str, &str)> {
        let mut lines = raw.split_inclusive('\n');
        let first = lines.next()?;
        if trim_eol(first) != MARKER {
            return None;
        }

        let block_start = first.len();
        let mut offset = block_start;
        for line in lines {
            if trim_eol(line) == MARKER {
                return Some((&raw[block_start..offset], &raw[offset + line.len()..]));
            }
            offset += line.len();
        }

        None
    }

    fn title_of(block: &str) -> Option<String> {
        block
            .lines()
            .find_map(|line| TITLE_RE.captures(trim_eol(line)))
            .map(|caps| unquote(caps[1].trim()).trim().to_string())
            .filter(|title| !title.is_empty())
    }
}

/// Drops a matching pair of surrounding quotes
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn strip_leading_blank_lines(text: &str) -> &str {
    let mut rest = text;
    while let Some(pos) = rest.find('\n') {
        if rest[..pos].trim().is_empty() {
            rest = &rest[pos + 1..];
        } else {
            break;
        }
    }
    if rest.trim().is_empty() {
        ""
    } else {
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_title() {
        let parsed = FrontMatter::parse("---\ntitle: \"Hello\"\n---\nBody text", "fallback");
        assert_eq!(parsed.title, "Hello");
        assert_eq!(parsed.body, "Body text");
    }

    #[test]
    fn test_strips_blank_lines_after_block() {
        let content = "---\ntitle: Plasma Pyrolysis\ndate: 2024-01-15\n---\n\n\nFirst line.\n\nSecond.\n";
        let parsed = FrontMatter::parse(content, "first-post");
        assert_eq!(parsed.title, "Plasma Pyrolysis");
        assert_eq!(parsed.body, "First line.\n\nSecond.\n");
    }

    #[test]
    fn test_no_front_matter_uses_fallback() {
        let content = "# Heading\n\nJust text.";
        let parsed = FrontMatter::parse(content, "F");
        assert_eq!(parsed.title, "F");
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_missing_title_keeps_original_text() {
        let content = "---\nauthor: someone\n---\nBody";
        let parsed = FrontMatter::parse(content, "F");
        assert_eq!(parsed.title, "F");
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_unclosed_block_is_not_metadata() {
        let content = "---\ntitle: Never closed\nBody";
        let parsed = FrontMatter::parse(content, "F");
        assert_eq!(parsed.title, "F");
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_block_must_open_the_text() {
        let content = "\n---\ntitle: Late\n---\nBody";
        let parsed = FrontMatter::parse(content, "F");
        assert_eq!(parsed.title, "F");
    }

    #[test]
    fn test_title_key_case_insensitive_and_single_quotes() {
        let parsed = FrontMatter::parse("---\nTITLE: 'Shouting'\n---\nx", "F");
        assert_eq!(parsed.title, "Shouting");
    }

    #[test]
    fn test_subtitle_is_not_title() {
        let parsed = FrontMatter::parse("---\nsubtitle: Nope\n---\nx", "F");
        assert_eq!(parsed.title, "F");
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = FrontMatter::parse("---\r\ntitle: \"Windows\"\r\n---\r\n\r\nBody\r\n", "F");
        assert_eq!(parsed.title, "Windows");
        assert_eq!(parsed.body, "Body\r\n");
    }

    #[test]
    fn test_mismatched_quotes_are_kept() {
        let parsed = FrontMatter::parse("---\ntitle: \"Hello'\n---\nBody", "x");
        assert_eq!(parsed.title, "\"Hello'");

        let parsed = FrontMatter::parse("---\ntitle: \"Don't\"\n---\nBody", "x");
        assert_eq!(parsed.title, "Don't");
    }

    #[test]
    fn test_empty_title_falls_back() {
        let content = "---\ntitle: \"\"\n---\nBody";
        let parsed = FrontMatter::parse(content, "F");
        assert_eq!(parsed.title, "F");
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_block_only() {
        let parsed = FrontMatter::parse("---\ntitle: Empty\n---\n\n", "F");
        assert_eq!(parsed.title, "Empty");
        assert_eq!(parsed.body, "");
    }
}
