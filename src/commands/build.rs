//! Build the site output

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::manifest;
use crate::Site;

/// Summary of a finished build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub static_files: usize,
    pub content_files: usize,
    pub manifest_entries: usize,
}

/// Build the site: clear the output, then materialize it again
pub fn run(site: &Site) -> Result<BuildReport> {
    let start = std::time::Instant::now();

    site.check_output_dir()?;
    clear_output(&site.output_dir)?;
    let report = materialize(site)?;

    tracing::info!(
        "Built {} posts, {} content files and {} static files in {:.2}s",
        report.manifest_entries,
        report.content_files,
        report.static_files,
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Remove the output tree if it exists
pub fn clear_output(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .with_context(|| format!("Failed to remove {:?}", output_dir))?;
        tracing::info!("Deleted: {:?}", output_dir);
    }
    Ok(())
}

/// Write the whole output tree from the current sources
fn materialize(site: &Site) -> Result<BuildReport> {
    let output_dir = &site.output_dir;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {:?}", output_dir))?;

    let static_files = copy_static_files(site)?;

    let content_dest = output_dir.join(&site.config.content_dir);
    let content_files = mirror_dir(&site.content_dir, &content_dest)?;

    let entries = manifest::scan(&site.blog_dir, &site.config.blog_url_prefix())?;
    manifest::write(&entries, &output_dir.join(&site.config.manifest_name))?;
    tracing::info!("Generated {}", site.config.manifest_name);

    write_placeholder_home(site)?;

    Ok(BuildReport {
        output_dir: output_dir.clone(),
        static_files,
        content_files,
        manifest_entries: entries.len(),
    })
}

/// Copy the configured top-level files that exist
fn copy_static_files(site: &Site) -> Result<usize> {
    let mut copied = 0;

    for file in &site.config.static_files {
        let src = site.base_dir.join(file);
        if !src.is_file() {
            tracing::debug!("Static file {:?} not found, skipping", src);
            continue;
        }

        let Some(name) = src.file_name() else {
            continue;
        };
        let dest = site.output_dir.join(name);
        fs::copy(&src, &dest).with_context(|| format!("Failed to copy {:?}", src))?;
        copied += 1;
    }

    Ok(copied)
}

/// Recursively copy `src` into `dest`. A missing `src` copies nothing.
fn mirror_dir(src: &Path, dest: &Path) -> Result<usize> {
    if !src.is_dir() {
        tracing::debug!("No content directory at {:?}", src);
        return Ok(0);
    }

    let mut copied = 0;

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", src))?;
        let path = entry.path();
        let relative = path.strip_prefix(src)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {:?}", target))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &target).with_context(|| format!("Failed to copy {:?}", path))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Write a bare home page unless one was copied in
fn write_placeholder_home(site: &Site) -> Result<()> {
    let index = site.output_dir.join("index.html");
    if index.exists() {
        return Ok(());
    }

    let title = html_escape::encode_text(&site.config.title);
    let html = format!(
        r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"><title>{title}</title></head><body><h1>{title}</h1><p>Build completed. Add an index.html at the project root for a custom homepage.</p></body></html>"#
    );
    fs::write(&index, html).with_context(|| format!("Failed to write {:?}", index))?;
    tracing::info!("Generated placeholder index.html");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestEntry;

    fn site_with_posts() -> (tempfile::TempDir, Site) {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("content/blog")).unwrap();
        fs::create_dir_all(base.join("content/images")).unwrap();
        fs::write(base.join("style.css"), "body {}").unwrap();
        fs::write(base.join("blog.html"), "<ul id=\"blog-index\"></ul>").unwrap();
        fs::write(base.join("content/about.md"), "About us").unwrap();
        fs::write(base.join("content/images/logo.png"), [0u8, 1, 2]).unwrap();
        fs::write(
            base.join("content/blog/first-post.md"),
            "---\ntitle: \"First Post\"\n---\n\nHello.",
        )
        .unwrap();
        fs::write(base.join("content/blog/second.md"), "No metadata").unwrap();

        let site = Site::new(base).unwrap();
        (dir, site)
    }

    fn files_under(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_build_output_tree() {
        let (_dir, site) = site_with_posts();
        let report = site.build().unwrap();

        assert_eq!(report.static_files, 2);
        assert_eq!(report.content_files, 4);
        assert_eq!(report.manifest_entries, 2);

        let out = &site.output_dir;
        assert_eq!(fs::read_to_string(out.join("style.css")).unwrap(), "body {}");
        assert_eq!(fs::read(out.join("content/images/logo.png")).unwrap(), [0u8, 1, 2]);
        assert!(out.join("content/blog/first-post.md").is_file());

        let entries = manifest::read(&out.join("blog.json")).unwrap();
        assert_eq!(
            entries,
            vec![
                ManifestEntry {
                    title: "First Post".to_string(),
                    path: "content/blog/first-post.md".to_string(),
                },
                ManifestEntry {
                    title: "second".to_string(),
                    path: "content/blog/second.md".to_string(),
                },
            ]
        );

        let home = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(home.contains("Build completed."));
    }

    #[test]
    fn test_rebuild_is_idempotent_and_drops_stale_files() {
        let (_dir, site) = site_with_posts();
        site.build().unwrap();
        let first_manifest = fs::read(site.output_dir.join("blog.json")).unwrap();
        let first_files = files_under(&site.output_dir);

        fs::write(site.output_dir.join("stale.txt"), "old").unwrap();
        site.build().unwrap();

        assert_eq!(
            fs::read(site.output_dir.join("blog.json")).unwrap(),
            first_manifest
        );
        assert_eq!(files_under(&site.output_dir), first_files);
        assert!(!site.output_dir.join("stale.txt").exists());
    }

    #[test]
    fn test_removed_post_disappears_from_output() {
        let (_dir, site) = site_with_posts();
        site.build().unwrap();

        fs::remove_file(site.blog_dir.join("second.md")).unwrap();
        let report = site.build().unwrap();

        assert_eq!(report.manifest_entries, 1);
        assert!(!site.output_dir.join("content/blog/second.md").exists());
    }

    #[test]
    fn test_build_without_content() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let report = site.build().unwrap();

        assert_eq!(report.manifest_entries, 0);
        assert_eq!(report.content_files, 0);
        assert_eq!(
            fs::read_to_string(site.output_dir.join("blog.json")).unwrap(),
            "[]"
        );
        assert!(site.output_dir.join("index.html").is_file());
    }

    #[test]
    fn test_existing_home_page_is_kept() {
        let (dir, site) = site_with_posts();
        fs::write(dir.path().join("index.html"), "<h1>Custom</h1>").unwrap();
        site.build().unwrap();
        assert_eq!(
            fs::read_to_string(site.output_dir.join("index.html")).unwrap(),
            "<h1>Custom</h1>"
        );
    }

    #[test]
    fn test_output_dir_over_sources_keeps_them() {
        let (dir, _) = site_with_posts();
        fs::write(dir.path().join("_config.yml"), "output_dir: .\n").unwrap();
        let site = Site::new(dir.path()).unwrap();

        assert!(site.build().is_err());
        assert!(site.clean().is_err());
        assert!(site.blog_dir.join("first-post.md").is_file());
        assert!(dir.path().join("_config.yml").is_file());
    }

    #[test]
    fn test_io_failure_aborts_build() {
        let (dir, site) = site_with_posts();
        // A file where the output directory belongs cannot be cleared
        fs::write(dir.path().join("dist"), "not a directory").unwrap();

        assert!(site.build().is_err());
        assert!(!dir.path().join("dist").is_dir());
    }

    #[test]
    fn test_unwritable_manifest_aborts_build() {
        let (dir, site) = site_with_posts();
        // The manifest would land on the mirrored content directory
        let mut config = site.config.clone();
        config.manifest_name = "content".to_string();
        let site = Site::with_config(dir.path().to_path_buf(), config);

        assert!(site.build().is_err());
    }

    #[test]
    fn test_clear_output_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        clear_output(&out).unwrap();
        fs::create_dir_all(out.join("nested")).unwrap();
        clear_output(&out).unwrap();
        assert!(!out.exists());
    }
}
