//! Object catalog discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Dataset;
use crate::error::AppError;

/// List the raw light-curve files of `dataset` under `raw_dir`.
///
/// A file belongs to the catalog when its name contains the dataset marker.
/// Paths are sorted so every simulated day walks objects in the same order.
pub fn list_catalog(raw_dir: &Path, dataset: Dataset) -> Result<Vec<PathBuf>, AppError> {
    let entries = fs::read_dir(raw_dir)
        .map_err(|e| AppError::load(format!("Failed to list raw data dir '{}': {e}", raw_dir.display())))?;

    let marker = dataset.catalog_marker();
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| AppError::load(format!("Failed to list raw data dir '{}': {e}", raw_dir.display())))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains(marker));
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_marked_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["DES_SN000002.DAT", "DES_SN000001.DAT", "README.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("DES_SN_subdir")).unwrap();

        let files = list_catalog(dir.path(), Dataset::Snpcc).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["DES_SN000001.DAT", "DES_SN000002.DAT"]);
    }

    #[test]
    fn missing_dir_is_a_load_error() {
        let err = list_catalog(Path::new("/nonexistent/raw"), Dataset::Snpcc).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Load);
    }
}
