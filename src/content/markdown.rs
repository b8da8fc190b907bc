//! Markdown rendering
//!
//! Rendering goes through one of two paths. When a [`MarkupConverter`] is
//! available the body is converted by it and then passed through the
//! [`Sanitizer`], if there is one. Without a converter the minimal renderer in
//! [`super::minimal`] is used.

use lazy_static::lazy_static;
use pulldown_cmark::{html, Event, Options, Parser};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::minimal::{self, heading_html};
use super::sanitize::HtmlSanitizer;
use crate::config::{MarkdownConfig, RenderConfig};

lazy_static! {
    static ref DEEP_HEADING_RE: Regex = Regex::new(r"^ {0,3}(#{7,10})[ \t]+(.+?)[ \t]*$").unwrap();
    static ref FENCE_RE: Regex = Regex::new(r"^ {0,3}(`{3,}|~{3,})(.*)$").unwrap();
}

/// Errors raised while rendering a single body
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to sanitize rendered HTML: {0}")]
    Sanitize(String),
}

/// Converts Markdown text into HTML
pub trait MarkupConverter: Send + Sync {
    fn convert(&self, markdown: &str) -> String;
}

/// Removes unsafe constructs from HTML
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> Result<String, RenderError>;
}

/// Markdown converter backed by pulldown-cmark
pub struct PulldownConverter {
    options: Options,
    hard_breaks: bool,
}

impl PulldownConverter {
    /// Create a converter with the given option flags
    pub fn new(config: &MarkdownConfig) -> Self {
        let mut options = Options::empty();
        if config.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if config.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if config.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if config.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }

        Self {
            options,
            hard_breaks: config.breaks,
        }
    }
}

impl Default for PulldownConverter {
    fn default() -> Self {
        Self::new(&MarkdownConfig::default())
    }
}

impl MarkupConverter for PulldownConverter {
    fn convert(&self, markdown: &str) -> String {
        let hard_breaks = self.hard_breaks;
        let parser = Parser::new_ext(markdown, self.options).map(|event| match event {
            Event::SoftBreak if hard_breaks => Event::HardBreak,
            other => other,
        });

        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);
        html_output
    }
}

/// Rendering capabilities available at call time. Either may be absent.
#[derive(Clone, Default)]
pub struct Capabilities {
    converter: Option<Arc<dyn MarkupConverter>>,
    sanitizer: Option<Arc<dyn Sanitizer>>,
}

impl Capabilities {
    /// No converter and no sanitizer
    pub fn none() -> Self {
        Self::default()
    }

    /// The built-in converter and sanitizer, each enabled by `render`
    pub fn builtin(markdown: &MarkdownConfig, render: &RenderConfig) -> Self {
        let mut caps = Self::none();
        if render.converter {
            caps = caps.with_converter(PulldownConverter::new(markdown));
        }
        if render.sanitizer {
            caps = caps.with_sanitizer(HtmlSanitizer::new());
        }
        caps
    }

    pub fn with_converter(mut self, converter: impl MarkupConverter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn without_sanitizer(mut self) -> Self {
        self.sanitizer = None;
        self
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    pub fn has_sanitizer(&self) -> bool {
        self.sanitizer.is_some()
    }
}

/// Which rendering path a [`MarkupRenderer`] takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Sanitized,
    Unsanitized,
    Minimal,
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererKind::Sanitized => write!(f, "markdown (sanitized)"),
            RendererKind::Unsanitized => write!(f, "markdown (unsanitized)"),
            RendererKind::Minimal => write!(f, "minimal"),
        }
    }
}

/// Markdown renderer selected from the available capabilities
#[derive(Clone)]
pub enum MarkupRenderer {
    Full {
        converter: Arc<dyn MarkupConverter>,
        sanitizer: Option<Arc<dyn Sanitizer>>,
    },
    Minimal,
}

impl MarkupRenderer {
    /// Pick the rendering path for `caps`
    pub fn select(caps: &Capabilities) -> Self {
        let renderer = match &caps.converter {
            Some(converter) => MarkupRenderer::Full {
                converter: Arc::clone(converter),
                sanitizer: caps.sanitizer.clone(),
            },
            None => MarkupRenderer::Minimal,
        };

        if renderer.kind() == RendererKind::Unsanitized {
            tracing::warn!("No HTML sanitizer available, rendered posts are not sanitized");
        }
        tracing::debug!("Selected {} renderer", renderer.kind());

        renderer
    }

    pub fn kind(&self) -> RendererKind {
        match self {
            MarkupRenderer::Full {
                sanitizer: Some(_), ..
            } => RendererKind::Sanitized,
            MarkupRenderer::Full { sanitizer: None, .. } => RendererKind::Unsanitized,
            MarkupRenderer::Minimal => RendererKind::Minimal,
        }
    }

    /// Render Markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String, RenderError> {
        match self {
            MarkupRenderer::Full {
                converter,
                sanitizer,
            } => {
                let html = converter.convert(&promote_deep_headings(markdown));
                match sanitizer {
                    Some(sanitizer) => sanitizer.sanitize(&html),
                    None => Ok(html),
                }
            }
            MarkupRenderer::Minimal => Ok(minimal::render(markdown)),
        }
    }
}

/// Rewrite headings deeper than `######` into `<h6 data-level="N">` HTML
/// blocks. Lines inside fenced code blocks are left alone.
fn promote_deep_headings(markdown: &str) -> Cow<'_, str> {
    if !markdown.contains("#######") {
        return Cow::Borrowed(markdown);
    }

    let mut out = String::with_capacity(markdown.len());
    // Opening fence character and run length
    let mut fence: Option<(char, usize)> = None;

    for line in markdown.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some(caps) = FENCE_RE.captures(content) {
            let run = &caps[1];
            let marker = run.chars().next().unwrap_or('`');
            match fence {
                // A closing fence is at least as long and carries no info string
                Some((open, len))
                    if open == marker && run.len() >= len && caps[2].trim().is_empty() =>
                {
                    fence = None
                }
                Some(_) => {}
                // Backtick fences may not have backticks in their info string
                None if marker == '`' && caps[2].contains('`') => {}
                None => fence = Some((marker, run.len())),
            }
            out.push_str(line);
            continue;
        }

        if fence.is_none() {
            if let Some(caps) = DEEP_HEADING_RE.captures(content) {
                let depth = caps[1].len();
                let text = html_escape::encode_text(&caps[2]);
                out.push_str(&heading_html(depth, &text));
                out.push_str("\n\n");
                continue;
            }
        }

        out.push_str(line);
    }

    Cow::Owned(out)
}
