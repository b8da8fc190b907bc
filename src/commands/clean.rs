//! Clean the build output

use anyhow::Result;

use super::build::clear_output;
use crate::Site;

/// Remove the output directory
pub fn run(site: &Site) -> Result<()> {
    site.check_output_dir()?;
    clear_output(&site.output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        site.build().unwrap();
        assert!(site.output_dir.exists());

        site.clean().unwrap();
        assert!(!site.output_dir.exists());

        // Cleaning twice is fine
        site.clean().unwrap();
    }
}
