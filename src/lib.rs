//! postmill: a small publishing pipeline for a static blog
//!
//! At build time the content directory is mirrored into the output and a
//! manifest of posts is written. At view time the manifest is read back, each
//! post is parsed and rendered to sanitized HTML, and the results fill the
//! index and content targets of the blog page.

pub mod commands;
pub mod config;
pub mod content;
pub mod loader;
pub mod manifest;
pub mod page;
pub mod server;

use anyhow::{bail, Result};
use std::path::{Component, Path, PathBuf};

/// Site configuration file name under the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// A site rooted at a directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content directory, mirrored into the output
    pub content_dir: PathBuf,
    /// Directory scanned for the manifest
    pub blog_dir: PathBuf,
    /// Build output directory
    pub output_dir: PathBuf,
}

impl Site {
    /// Create a new site from a directory, reading [`CONFIG_FILE`] if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site with an explicit configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let content_dir = base_dir.join(&config.content_dir);
        let blog_dir = content_dir.join(&config.blog_dir);
        let output_dir = base_dir.join(&config.output_dir);

        Self {
            config,
            base_dir,
            content_dir,
            blog_dir,
            output_dir,
        }
    }

    /// Refuse an output directory whose removal would take the sources with it
    pub fn check_output_dir(&self) -> Result<()> {
        let output = normalize(&self.output_dir);
        let base = normalize(&self.base_dir);
        let content = normalize(&self.content_dir);

        if base.starts_with(&output) || content.starts_with(&output) || output.starts_with(&content)
        {
            bail!(
                "Refusing to use {:?} as output directory: it overlaps the site sources",
                self.output_dir
            );
        }
        Ok(())
    }

    /// Rendering capabilities enabled by the configuration
    pub fn capabilities(&self) -> content::Capabilities {
        content::Capabilities::builtin(&self.config.markdown, &self.config.render)
    }

    /// Build the site
    pub fn build(&self) -> Result<commands::build::BuildReport> {
        commands::build::run(self)
    }

    /// Remove the build output
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

/// Resolve `.` and `..` without touching the file system
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
