use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::loader::is_supported;
use crate::error::{OutlierError, Result};

/// File name prefix of subject series (`sub-01_task-rest_bold.parquet`).
pub const SERIES_PREFIX: &str = "sub-";

/// Recursively list subject series under `directory`.
///
/// Entries are visited in file-name order at every level, so the returned
/// list is stable across runs. Only files named `sub-*` with a loadable
/// extension are kept.
pub fn list_series(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(OutlierError::Discovery {
            path: directory.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(|e| OutlierError::Discovery {
            path: directory.to_path_buf(),
            reason: e.to_string(),
        })?;
        if entry.file_type().is_file() && is_series_file(entry.path()) {
            found.push(entry.into_path());
        }
    }

    log::debug!("found {} series under {}", found.len(), directory.display());
    Ok(found)
}

fn is_series_file(path: &Path) -> bool {
    let named_like_subject = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(SERIES_PREFIX));
    named_like_subject && is_supported(path)
}
