//! Error taxonomy for the explorer engine.
//!
//! Failures are scoped to what they affect: a [`StatError`] drops one entry,
//! a [`DirectoryError`] fails one listing call, a [`ScanError`] fails one
//! scan before it starts. Per-entry and per-subtree failures inside a scan
//! are recorded as warnings on the snapshot instead (see
//! [`crate::index::ScanWarning`]) and never abort traversal.

use std::path::PathBuf;

/// A single entry could not be statted.
///
/// Tolerated everywhere it can occur: the entry is dropped from the listing
/// or index rather than aborting the surrounding operation.
#[derive(Debug, thiserror::Error)]
#[error("unable to read metadata for {}: {}", .path.display(), .source)]
pub struct StatError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Terminal errors for one directory-listing call.
///
/// Distinct from per-entry stat failures, which are skipped; these mean the
/// requested directory itself could not be listed and no partial listing is
/// returned.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("IO error listing {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

/// The one hard scan failure: the root itself cannot be scanned.
///
/// Everything below the root degrades to warnings on the snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan root unreachable {}: {}", .path.display(), .source)]
    RootUnreachable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("scan root is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),
}

/// Failures dispatching a path to the OS default application.
///
/// None of these are retried; a missing handler or permission problem
/// cannot resolve without external state change.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no application available to open {}", .0.display())]
    NoHandler(PathBuf),

    #[error("permission denied opening {}", .0.display())]
    PermissionDenied(PathBuf),
}
