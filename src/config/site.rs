//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,

    // Directory
    /// Content directory, mirrored verbatim into the output
    pub content_dir: String,
    /// Subdirectory of `content_dir` holding the posts listed in the manifest
    pub blog_dir: String,
    pub output_dir: String,

    // Build
    /// Top-level files copied into the output when present
    pub static_files: Vec<String>,
    pub manifest_name: String,
    /// Page template holding the blog index and content targets
    pub blog_page: String,

    // Rendering
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),

            content_dir: "content".to_string(),
            blog_dir: "blog".to_string(),
            output_dir: "dist".to_string(),

            static_files: vec![
                "index.html".to_string(),
                "style.css".to_string(),
                "app.js".to_string(),
                "blog.html".to_string(),
            ],
            manifest_name: "blog.json".to_string(),
            blog_page: "blog.html".to_string(),

            markdown: MarkdownConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        Ok(config)
    }

    /// Site-relative URL prefix of the posts listed in the manifest
    pub fn blog_url_prefix(&self) -> String {
        format!(
            "{}/{}",
            self.content_dir.trim_matches('/'),
            self.blog_dir.trim_matches('/')
        )
    }
}

/// Markdown converter option flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub smart_punctuation: bool,
    /// Render single newlines as `<br>`
    pub breaks: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            tasklists: true,
            smart_punctuation: false,
            breaks: false,
        }
    }
}

/// Which rendering capabilities are made available at runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub converter: bool,
    pub sanitizer: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            converter: true,
            sanitizer: true,
        }
    }
}
