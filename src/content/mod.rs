//! Content module - front-matter, Markdown rendering and slugs

mod frontmatter;
mod markdown;
pub mod minimal;
mod sanitize;
mod slug;

pub use frontmatter::{FrontMatter, ParsedContent};
pub use markdown::{
    Capabilities, MarkupConverter, MarkupRenderer, PulldownConverter, RenderError, RendererKind,
    Sanitizer,
};
pub use sanitize::HtmlSanitizer;
pub use slug::slugify;
