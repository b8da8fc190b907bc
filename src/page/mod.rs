//! Blog page assembly
//!
//! The blog page template provides up to two targets: a list with id
//! `blog-index` and a container with id `blog-posts`. The loader only fills
//! the targets the template actually has.

use anyhow::{anyhow, Result};
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use std::fs;

use crate::content::{Capabilities, MarkupRenderer};
use crate::loader::{
    ContentLoader, ContentNode, ContentSource, IndexNode, Notice, TargetSet, Targets,
};
use crate::Site;

pub const INDEX_TARGET_ID: &str = "blog-index";
pub const CONTENT_TARGET_ID: &str = "blog-posts";

/// Blog page used when the site has none of its own
pub const DEFAULT_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Blog</title>
<link rel="stylesheet" href="style.css">
</head>
<body>
<main>
<h1>Blog</h1>
<ul id="blog-index"></ul>
<section id="blog-posts"></section>
</main>
</body>
</html>
"#;

/// Find which targets `template` provides
pub fn detect_targets(template: &str) -> Result<TargetSet> {
    let mut found = TargetSet::default();

    rewrite_str(
        template,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(format!("#{}", INDEX_TARGET_ID), |_el| {
                    found.index = true;
                    Ok(())
                }),
                element!(format!("#{}", CONTENT_TARGET_ID), |_el| {
                    found.content = true;
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| anyhow!("Failed to scan page template: {}", e))?;

    Ok(found)
}

/// Append the loaded targets to their elements in `template`
pub fn fill(template: &str, targets: &Targets) -> Result<String> {
    let index_html = targets.index.as_deref().map(index_html);
    let content_html = targets.content.as_deref().map(content_html);

    let filled = rewrite_str(
        template,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(format!("#{}", INDEX_TARGET_ID), |el| {
                    if let Some(html) = &index_html {
                        el.append(html, ContentType::Html);
                    }
                    Ok(())
                }),
                element!(format!("#{}", CONTENT_TARGET_ID), |el| {
                    if let Some(html) = &content_html {
                        el.append(html, ContentType::Html);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| anyhow!("Failed to fill page template: {}", e));
    filled
}

/// Markup for the index list
pub fn index_html(nodes: &[IndexNode]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            IndexNode::Entry(entry) => format!(
                r##"<li><a href="#{}">{}</a></li>"##,
                html_escape::encode_double_quoted_attribute(&entry.anchor),
                html_escape::encode_text(&entry.title)
            ),
            IndexNode::Notice(notice) => {
                format!(r#"<li class="placeholder">{}</li>"#, notice.message())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markup for the content container
pub fn content_html(nodes: &[ContentNode]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            ContentNode::Block(block) => format!(
                r#"<article id="{}"><h2>{}</h2>{}</article>"#,
                html_escape::encode_double_quoted_attribute(&block.id),
                html_escape::encode_text(&block.title),
                block.html_body
            ),
            ContentNode::Failed(failed) => format!(
                r#"<article class="post-error"><p>Failed to load {}.</p></article>"#,
                html_escape::encode_text(&failed.label)
            ),
            ContentNode::Notice(notice) => placeholder(*notice),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn placeholder(notice: Notice) -> String {
    format!(r#"<p class="placeholder">{}</p>"#, notice.message())
}

/// Run the loader for the targets in `template` and return the filled page
pub async fn render<S: ContentSource>(
    template: &str,
    source: &S,
    renderer: MarkupRenderer,
    manifest_path: &str,
) -> Result<String> {
    let wanted = detect_targets(template)?;
    if wanted == TargetSet::default() {
        tracing::warn!("Blog page has neither #{} nor #{}", INDEX_TARGET_ID, CONTENT_TARGET_ID);
    }

    let targets = ContentLoader::new(source, renderer)
        .with_manifest_path(manifest_path)
        .load(wanted)
        .await;

    fill(template, &targets)
}

/// Blog page template from the build output, or [`DEFAULT_TEMPLATE`]
pub fn load_template(site: &Site) -> Result<String> {
    let path = site.output_dir.join(&site.config.blog_page);
    if path.is_file() {
        Ok(fs::read_to_string(&path)?)
    } else {
        tracing::debug!("No blog page at {:?}, using the built-in one", path);
        Ok(DEFAULT_TEMPLATE.to_string())
    }
}

/// Render the site's blog page with `source` and the given capabilities
pub async fn render_site<S: ContentSource>(
    site: &Site,
    source: &S,
    caps: &Capabilities,
) -> Result<String> {
    let template = load_template(site)?;
    render(
        &template,
        source,
        MarkupRenderer::select(caps),
        &site.config.manifest_name,
    )
    .await
}
