//! Content loader - turns the manifest into an index and rendered posts
//!
//! The loader fetches the manifest, then walks its entries in order. Each
//! entry yields an [`ItemOutcome`]; a failed fetch or render becomes a
//! [`FailedItem`] in that entry's slot and never stops the entries after it.

mod source;

pub use source::{ContentSource, DirSource, FetchError, HttpSource};

use serde_json::Value;
use thiserror::Error;

use crate::content::{slugify, FrontMatter, MarkupRenderer, RenderError};

/// Default site-relative location of the manifest
pub const MANIFEST_PATH: &str = "blog.json";

/// A post ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    /// Slug of the title; not unique when titles collide
    pub id: String,
    pub title: String,
    pub html_body: String,
}

/// A line of the index list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub title: String,
    pub anchor: String,
}

/// Placeholder shown in place of a whole target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LoadFailed,
    NoPosts,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::LoadFailed => "Failed to load posts.",
            Notice::NoPosts => "No posts yet.",
        }
    }
}

/// Why a single post could not be shown
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("manifest entry has no path")]
    MissingPath,
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

/// A post that failed, named by its title or path
#[derive(Debug)]
pub struct FailedItem {
    pub label: String,
    pub error: ItemError,
}

pub type ItemOutcome = Result<RenderedBlock, FailedItem>;

#[derive(Debug)]
pub enum IndexNode {
    Entry(IndexEntry),
    Notice(Notice),
}

#[derive(Debug)]
pub enum ContentNode {
    Block(RenderedBlock),
    Failed(FailedItem),
    Notice(Notice),
}

/// Which output targets the page provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetSet {
    pub index: bool,
    pub content: bool,
}

impl TargetSet {
    pub fn both() -> Self {
        Self {
            index: true,
            content: true,
        }
    }
}

/// Loader output. A target is `None` when the page does not provide it.
#[derive(Debug, Default)]
pub struct Targets {
    pub index: Option<Vec<IndexNode>>,
    pub content: Option<Vec<ContentNode>>,
}

impl Targets {
    fn empty(wanted: TargetSet) -> Self {
        Self {
            index: wanted.index.then(Vec::new),
            content: wanted.content.then(Vec::new),
        }
    }

    fn notice(wanted: TargetSet, notice: Notice) -> Self {
        let mut targets = Self::empty(wanted);
        if let Some(index) = targets.index.as_mut() {
            index.push(IndexNode::Notice(notice));
        }
        if let Some(content) = targets.content.as_mut() {
            content.push(ContentNode::Notice(notice));
        }
        targets
    }
}

/// A manifest element as read at runtime. Missing or empty fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestRef {
    pub title: Option<String>,
    pub path: Option<String>,
}

impl ManifestRef {
    fn from_value(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            title: field("title"),
            path: field("path"),
        }
    }

    /// Title, else path, else a generic name
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or("untitled post")
    }

    /// Index anchor: slug of the title, else of the path
    pub fn anchor(&self) -> String {
        slugify(self.title.as_deref().or(self.path.as_deref()).unwrap_or(""))
    }
}

#[derive(Debug, Error)]
enum ManifestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest is not a list")]
    NotAList,
}

/// Loads posts listed in the manifest from a [`ContentSource`]
pub struct ContentLoader<'a, S> {
    source: &'a S,
    renderer: MarkupRenderer,
    manifest_path: String,
}

impl<'a, S: ContentSource> ContentLoader<'a, S> {
    /// Create a loader reading the manifest from [`MANIFEST_PATH`]
    pub fn new(source: &'a S, renderer: MarkupRenderer) -> Self {
        Self {
            source,
            renderer,
            manifest_path: MANIFEST_PATH.to_string(),
        }
    }

    pub fn with_manifest_path(mut self, path: impl Into<String>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Fill the wanted targets
    pub async fn load(&self, wanted: TargetSet) -> Targets {
        let entries = match self.fetch_manifest().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to load manifest {}: {}", self.manifest_path, e);
                return Targets::notice(wanted, Notice::LoadFailed);
            }
        };

        if entries.is_empty() {
            tracing::debug!("Manifest {} is empty", self.manifest_path);
            return Targets::notice(wanted, Notice::NoPosts);
        }

        let mut targets = Targets::empty(wanted);

        if let Some(index) = targets.index.as_mut() {
            index.extend(entries.iter().map(|entry| {
                IndexNode::Entry(IndexEntry {
                    title: entry.label().to_string(),
                    anchor: entry.anchor(),
                })
            }));
        }

        if let Some(content) = targets.content.as_mut() {
            for outcome in self.load_items(&entries).await {
                content.push(match outcome {
                    Ok(block) => ContentNode::Block(block),
                    Err(failed) => ContentNode::Failed(failed),
                });
            }
        }

        targets
    }

    /// Load every entry in order, one at a time
    pub async fn load_items(&self, entries: &[ManifestRef]) -> Vec<ItemOutcome> {
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            outcomes.push(self.load_item(entry).await);
        }
        outcomes
    }

    /// Fetch, parse and render a single entry
    pub async fn load_item(&self, entry: &ManifestRef) -> ItemOutcome {
        self.try_load_item(entry).await.map_err(|error| {
            tracing::warn!("Failed to load post {}: {}", entry.label(), error);
            FailedItem {
                label: entry.label().to_string(),
                error,
            }
        })
    }

    async fn try_load_item(&self, entry: &ManifestRef) -> Result<RenderedBlock, ItemError> {
        let path = entry.path.as_deref().ok_or(ItemError::MissingPath)?;
        let raw = self.source.fetch(path).await?;

        let parsed = FrontMatter::parse(&raw, entry.label());
        let html_body = self.renderer.render(&parsed.body)?;

        let id = [
            Some(parsed.title.as_str()),
            entry.title.as_deref(),
            entry.path.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(slugify)
        .find(|slug| !slug.is_empty())
        .unwrap_or_default();

        tracing::debug!("Rendered post {} as #{}", parsed.title, id);

        Ok(RenderedBlock {
            id,
            title: parsed.title,
            html_body,
        })
    }

    async fn fetch_manifest(&self) -> Result<Vec<ManifestRef>, ManifestError> {
        let text = self.source.fetch(&self.manifest_path).await?;
        let value: Value = serde_json::from_str(&text)?;
        let Value::Array(items) = value else {
            return Err(ManifestError::NotAList);
        };
        Ok(items.iter().map(ManifestRef::from_value).collect())
    }
}
