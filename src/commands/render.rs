//! Render the blog page from a build

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::content::Capabilities;
use crate::loader::{DirSource, HttpSource};
use crate::page;
use crate::Site;

/// Render the blog page and write it to `out`, or stdout.
///
/// Posts are read from the build output directory unless `origin` names a
/// server to fetch them from.
pub async fn run(
    site: &Site,
    caps: &Capabilities,
    origin: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let html = match origin {
        Some(origin) => {
            tracing::info!("Loading posts from {}", origin);
            let source = HttpSource::new(origin)?;
            page::render_site(site, &source, caps).await?
        }
        None => {
            tracing::info!("Loading posts from {:?}", site.output_dir);
            let source = DirSource::new(&site.output_dir);
            page::render_site(site, &source, caps).await?
        }
    };

    match out {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!("Wrote {:?}", path);
        }
        None => println!("{}", html),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_render_built_site_to_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content/blog")).unwrap();
        fs::write(
            dir.path().join("content/blog/first-post.md"),
            "---\ntitle: \"Waste to Syngas\"\n---\n\nAn article describing the waste management process.",
        )
        .unwrap();

        let site = Site::new(dir.path()).unwrap();
        site.build().unwrap();

        let out = dir.path().join("rendered.html");
        run(&site, &site.capabilities(), None, Some(&out)).await.unwrap();

        let html = fs::read_to_string(&out).unwrap();
        assert!(html.contains(r#"<article id="waste-to-syngas">"#));
        assert!(html.contains("waste management process"));
    }

    #[tokio::test]
    async fn test_render_unbuilt_site_shows_failure_notice() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();

        let out = dir.path().join("rendered.html");
        run(&site, &Capabilities::none(), None, Some(&out)).await.unwrap();

        let html = fs::read_to_string(&out).unwrap();
        assert!(html.contains("Failed to load posts."));
    }
}
