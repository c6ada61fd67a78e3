//! Opening a path with the OS default application.
//!
//! Strictly a side-effecting boundary call: no state, no interpretation of
//! file content, no retries.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::OpenError;

/// Dispatches `path` to the OS default handler for its type.
pub fn open_path(path: &Path) -> Result<(), OpenError> {
    if let Err(error) = fs::symlink_metadata(path) {
        return Err(match error.kind() {
            io::ErrorKind::PermissionDenied => OpenError::PermissionDenied(path.to_path_buf()),
            _ => OpenError::NotFound(path.to_path_buf()),
        });
    }

    opener::open(path).map_err(|error| classify_open_error(path, error))
}

fn classify_open_error(path: &Path, error: opener::OpenError) -> OpenError {
    if let opener::OpenError::Io(io_error) = &error {
        if io_error.kind() == io::ErrorKind::PermissionDenied {
            return OpenError::PermissionDenied(path.to_path_buf());
        }
    }
    log::warn!("no handler launched for {}: {error}", path.display());
    OpenError::NoHandler(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_path_is_not_found() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("gone.txt");
        assert!(matches!(
            open_path(&missing),
            Err(OpenError::NotFound(_))
        ));
    }
}
