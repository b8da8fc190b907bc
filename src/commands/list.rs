//! List the posts a build would publish

use anyhow::Result;

use crate::manifest::{self, ManifestEntry};
use crate::Site;

/// Scan the posts directory without building
pub fn entries(site: &Site) -> Result<Vec<ManifestEntry>> {
    manifest::scan(&site.blog_dir, &site.config.blog_url_prefix())
}

/// Print the manifest entries in display order
pub fn run(site: &Site) -> Result<()> {
    let entries = entries(site)?;
    println!("Posts ({}):", entries.len());
    for entry in entries {
        println!("  {} [{}]", entry.title, entry.path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_entries_match_manifest_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content/blog")).unwrap();
        fs::write(dir.path().join("content/blog/b.md"), "---\ntitle: Bee\n---\n").unwrap();
        fs::write(dir.path().join("content/blog/a.md"), "plain").unwrap();

        let site = Site::new(dir.path()).unwrap();
        let titles: Vec<String> = entries(&site).unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["a", "Bee"]);
    }
}
