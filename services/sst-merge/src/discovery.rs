//! Input file discovery.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use grid_merge::DiscoveryConfig;
use tracing::debug;
use walkdir::WalkDir;

/// List the files directly inside `dir` that pass `filter`, sorted by name.
///
/// Subdirectories are not searched. Finding nothing is an error.
pub fn discover_inputs(dir: &Path, filter: &DiscoveryConfig) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("input directory {} does not exist", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if filter.matches(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        bail!(
            "no input files in {} (expected names containing '{}' with extension .{})",
            dir.display(),
            filter.name_contains,
            filter.extension
        );
    }

    debug!(dir = %dir.display(), files = files.len(), "Discovered input files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "20200103-UKMO-L4_GHRSST-SSTfnd-OSTIA-GLOB-v02.0-fv02.0.nc");
        touch(dir.path(), "20200101-UKMO-L4_GHRSST-SSTfnd-OSTIA-GLOB-v02.0-fv02.0.nc");
        touch(dir.path(), "20200102-OSTIA.nc.md5");
        touch(dir.path(), "20200102-ODYSSEA.nc");
        touch(dir.path(), "notes.txt");

        let files = discover_inputs(dir.path(), &DiscoveryConfig::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "20200101-UKMO-L4_GHRSST-SSTfnd-OSTIA-GLOB-v02.0-fv02.0.nc",
                "20200103-UKMO-L4_GHRSST-SSTfnd-OSTIA-GLOB-v02.0-fv02.0.nc",
            ]
        );
    }

    #[test]
    fn test_does_not_recurse() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2019");
        std::fs::create_dir(&nested).unwrap();
        touch(&nested, "20190101-OSTIA.nc");
        touch(dir.path(), "20200101-OSTIA.nc");

        let files = discover_inputs(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_no_match_is_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md");
        let err = discover_inputs(dir.path(), &DiscoveryConfig::default()).unwrap_err();
        assert!(err.to_string().contains("OSTIA"));
    }

    #[test]
    fn test_missing_directory() {
        let err = discover_inputs(Path::new("/nonexistent/sst"), &DiscoveryConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_custom_filter() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "day1-ODYSSEA.nc4");
        let filter = DiscoveryConfig {
            name_contains: "ODYSSEA".to_string(),
            extension: "nc4".to_string(),
        };
        assert_eq!(discover_inputs(dir.path(), &filter).unwrap().len(), 1);
    }
}
