//! Blog manifest - the ordered list of posts written at build time

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::FrontMatter;

/// Extension of post files, matched case-insensitively
const MARKDOWN_EXTENSION: &str = "md";

/// A post reference in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub title: String,
    /// Site-relative URL path of the post source
    pub path: String,
}

/// Scan `dir` for posts.
///
/// Only direct children with a `.md` extension are listed, sorted by file
/// name. Each entry's title comes from the post's front-matter, falling back
/// to the file name without its extension. `url_prefix` is joined with the
/// file name to form the entry path. A missing directory yields no entries.
pub fn scan(dir: &Path, url_prefix: &str) -> Result<Vec<ManifestEntry>> {
    if !dir.is_dir() {
        tracing::debug!("No posts directory at {:?}", dir);
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to list {:?}", dir))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            tracing::warn!("Skipping non UTF-8 file name {:?}", entry.path());
            continue;
        };
        let Some(stem) = markdown_stem(file_name) else {
            continue;
        };

        let raw = fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {:?}", entry.path()))?;
        let parsed = FrontMatter::parse(&raw, stem);

        tracing::debug!("Manifest entry {:?} -> {}", file_name, parsed.title);

        entries.push(ManifestEntry {
            title: parsed.title,
            path: join_url(url_prefix, file_name),
        });
    }

    Ok(entries)
}

/// Write the manifest as pretty-printed JSON
pub fn write(entries: &[ManifestEntry], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

/// Read a manifest written by [`write`]
pub fn read(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let entries = serde_json::from_str(&content)
        .with_context(|| format!("Invalid manifest {:?}", path))?;
    Ok(entries)
}

/// File name without its `.md` extension, if it has one
fn markdown_stem(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION)
        .then_some(stem)
        .filter(|stem| !stem.is_empty())
}

fn join_url(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}
