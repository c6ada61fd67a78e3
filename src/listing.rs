//! On-demand listing of one directory's direct children.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::entry::{sort_entries, Entry};
use crate::error::DirectoryError;

/// Lists the direct children of `path`, sorted by the shared ordering
/// contract (directories first, then case-insensitive name).
///
/// Children that fail to stat are skipped and logged; partial listings are
/// valid and expected on permission-restricted trees. Only failures on the
/// requested directory itself are surfaced as [`DirectoryError`].
pub fn list_directory(path: &Path) -> Result<Vec<Entry>, DirectoryError> {
    let path = normalize_directory_path(path);

    let metadata = fs::metadata(&path).map_err(|error| classify_io_error(&path, error))?;
    if !metadata.is_dir() {
        return Err(DirectoryError::NotADirectory(path));
    }

    let read_dir = fs::read_dir(&path).map_err(|error| classify_io_error(&path, error))?;

    let mut entries = Vec::new();
    for child in read_dir {
        let child = match child {
            Ok(child) => child,
            Err(error) => {
                log::debug!("unreadable entry under {}: {error}", path.display());
                continue;
            }
        };
        match Entry::from_path(&child.path()) {
            Ok(entry) => entries.push(entry),
            Err(error) => log::debug!("skipping during listing: {error}"),
        }
    }

    sort_entries(&mut entries);
    Ok(entries)
}

/// Re-joins the path's components, dropping trailing separators so callers
/// need not normalize (`/tmp/dir/` lists like `/tmp/dir`).
pub(crate) fn normalize_directory_path(path: &Path) -> PathBuf {
    path.components().collect()
}

fn classify_io_error(path: &Path, error: io::Error) -> DirectoryError {
    match error.kind() {
        io::ErrorKind::NotFound => DirectoryError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => DirectoryError::PermissionDenied(path.to_path_buf()),
        io::ErrorKind::NotADirectory => DirectoryError::NotADirectory(path.to_path_buf()),
        _ => DirectoryError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
