//! The entry model shared by listings and search results.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::error::StatError;

/// One filesystem node as reported to the UI.
///
/// `path` is the unique identity key within a snapshot; `name` is its last
/// component. `extension` is the lowercase suffix without the dot and is
/// absent for directories and extensionless files; its absence is the
/// outward file/directory discriminator, kept alongside the explicit
/// `is_directory` flag so renderers never re-derive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub path: String,
    pub name: String,
    pub extension: Option<String>,
    pub size: u64,
    pub modified: u64,
    pub is_directory: bool,
}

impl Entry {
    /// Builds an entry from OS metadata.
    ///
    /// Fails with [`StatError`] when the metadata call fails (entry vanished
    /// between enumeration and stat, broken link); callers skip such entries
    /// rather than abort. Symlinks are followed, so a symlink to a directory
    /// counts as a directory.
    pub fn from_path(path: &Path) -> Result<Self, StatError> {
        let stat_error = |source| StatError {
            path: path.to_path_buf(),
            source,
        };
        let metadata = fs::metadata(path).map_err(stat_error)?;
        let is_directory = metadata.is_dir();

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            // Volume roots like "/" have no final component.
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let extension = if is_directory {
            None
        } else {
            path.extension().and_then(|ext| ext.to_str()).map(fold)
        };

        let modified = metadata
            .modified()
            .map_err(stat_error)?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Ok(Self {
            path: path.to_string_lossy().into_owned(),
            name,
            extension,
            size: if is_directory { 0 } else { metadata.len() },
            modified,
            is_directory,
        })
    }
}

/// Case folding used for every name and extension comparison in the crate.
pub(crate) fn fold(value: &str) -> String {
    value.to_lowercase()
}

/// The shared ordering contract: directories before files, then
/// case-insensitive lexicographic by name.
///
/// Listings and search results sort identically so the UI can reuse one
/// renderer for both.
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| fold(&a.name).cmp(&fold(&b.name)))
        .then_with(|| a.name.cmp(&b.name))
}

/// Sorts entries by [`compare_entries`].
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(compare_entries);
}
