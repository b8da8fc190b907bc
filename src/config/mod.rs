//! Configuration module

mod site;

pub use site::MarkdownConfig;
pub use site::RenderConfig;
pub use site::SiteConfig;
