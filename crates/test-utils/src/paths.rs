//! Temporary directory helpers for tests that write files.

use std::path::{Path, PathBuf};

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// OSTIA-style file name for a day offset, e.g.
/// `day00001-UKMO-L4_GHRSST-SSTfnd-OSTIA-GLOB-v02.0-fv02.0.nc`.
///
/// Names sort in day order, which is the order directory discovery uses.
pub fn ostia_file_name(day: i64) -> String {
    format!("day{:05}-UKMO-L4_GHRSST-SSTfnd-OSTIA-GLOB-v02.0-fv02.0.nc", day)
}

/// Path of the OSTIA-style file for `day` inside `dir`.
pub fn ostia_file_path(dir: &Path, day: i64) -> PathBuf {
    dir.join(ostia_file_name(day))
}

/// Lists the regular files in a directory, sorted by name.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("Failed to read test directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_test_dir() {
        let dir = temp_test_dir();
        assert!(dir.path().exists());
        // Dir is cleaned up when dropped
    }

    #[test]
    fn test_ostia_names_sort_by_day() {
        let mut names = vec![ostia_file_name(10), ostia_file_name(2), ostia_file_name(1)];
        names.sort();
        assert_eq!(names[0], ostia_file_name(1));
        assert_eq!(names[2], ostia_file_name(10));
        assert!(names[0].contains("OSTIA"));
        assert!(names[0].ends_with(".nc"));
    }

    #[test]
    fn test_list_files_sorted() {
        let dir = temp_test_dir();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let files = list_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.txt"));
    }
}
