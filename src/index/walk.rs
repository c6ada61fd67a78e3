//! Breadth-first filesystem walk feeding an index snapshot.
//!
//! Shallow directories are visited first so a search against a growing
//! snapshot sees the most navigable part of the tree early. Each visit
//! enumerates one directory, stats its children in parallel, and inserts
//! the results under one short write lock.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use rayon::prelude::*;

use super::data::{IndexSnapshot, ScanWarning};
use crate::entry::Entry;

/// Borrowed configuration and counters for one walk.
#[derive(Debug)]
pub struct WalkContext<'a> {
    pub root: &'a Path,
    /// Subtree prefixes excluded from the walk.
    pub ignored_roots: &'a [PathBuf],
    /// Checked between directory visits, never mid-enumeration.
    pub cancel: &'a AtomicBool,
    pub scanned_files: &'a AtomicUsize,
    pub scanned_dirs: &'a AtomicUsize,
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Finished,
    Cancelled,
    /// The root itself could not be enumerated. The one hard failure.
    RootUnreachable,
}

/// Walks `context.root` breadth-first, inserting every child entry into
/// `snapshot` one directory at a time.
///
/// Inaccessible subtrees and symlink cycles are recorded as warnings and
/// skipped; the walk never aborts wholesale for anything below the root.
/// On cancellation the snapshot is left exactly as populated so far.
pub fn walk_into(context: &WalkContext<'_>, snapshot: &RwLock<IndexSnapshot>) -> WalkOutcome {
    let mut visited = HashSet::new();
    visited.insert(canonical_or_original(context.root));

    if context.cancel.load(Ordering::Relaxed) {
        return WalkOutcome::Cancelled;
    }

    let mut queue: VecDeque<PathBuf> =
        match visit_directory(context.root, context, &mut visited, snapshot) {
            Ok(subdirectories) => subdirectories.into(),
            Err(error) => {
                log::warn!("scan root unreachable {}: {error}", context.root.display());
                return WalkOutcome::RootUnreachable;
            }
        };

    while let Some(directory) = queue.pop_front() {
        if context.cancel.load(Ordering::Relaxed) {
            return WalkOutcome::Cancelled;
        }

        match visit_directory(&directory, context, &mut visited, snapshot) {
            Ok(subdirectories) => queue.extend(subdirectories),
            Err(error) => {
                log::warn!(
                    "skipping inaccessible subtree {}: {error}",
                    directory.display()
                );
                let mut guard = snapshot.write().unwrap_or_else(PoisonError::into_inner);
                guard.push_warning(ScanWarning::SubtreeInaccessible {
                    path: directory.to_string_lossy().into_owned(),
                });
            }
        }
    }

    WalkOutcome::Finished
}

/// Enumerates one directory, inserts its children into the snapshot, and
/// returns the subdirectories to visit next.
fn visit_directory(
    directory: &Path,
    context: &WalkContext<'_>,
    visited: &mut HashSet<PathBuf>,
    snapshot: &RwLock<IndexSnapshot>,
) -> io::Result<Vec<PathBuf>> {
    let read_dir = fs::read_dir(directory)?;
    context.scanned_dirs.fetch_add(1, Ordering::Relaxed);

    let children: Vec<PathBuf> = read_dir
        .filter_map(|child| match child {
            Ok(child) => Some(child.path()),
            Err(error) => {
                log::debug!("unreadable entry under {}: {error}", directory.display());
                None
            }
        })
        .filter(|path| !is_ignored(path, context.ignored_roots))
        .collect();

    // Stat children in parallel; entries that vanish mid-scan drop out.
    let entries: Vec<Entry> = children
        .par_iter()
        .filter_map(|path| match Entry::from_path(path) {
            Ok(entry) => Some(entry),
            Err(error) => {
                log::debug!("skipping during scan: {error}");
                None
            }
        })
        .collect();

    let file_count = entries.iter().filter(|entry| !entry.is_directory).count();
    context.scanned_files.fetch_add(file_count, Ordering::Relaxed);

    let mut subdirectories = Vec::new();
    let mut warnings = Vec::new();
    for entry in &entries {
        if !entry.is_directory {
            continue;
        }
        let path = PathBuf::from(&entry.path);
        match fs::canonicalize(&path) {
            Ok(canonical) => {
                // First visitor of a canonical path wins; any later spelling
                // (a cycle or a second link) is skipped.
                if visited.insert(canonical) {
                    subdirectories.push(path);
                } else {
                    warnings.push(ScanWarning::CycleSkipped {
                        path: entry.path.clone(),
                    });
                }
            }
            Err(error) => {
                log::debug!("cannot canonicalize {}: {error}", path.display());
                warnings.push(ScanWarning::SubtreeInaccessible {
                    path: entry.path.clone(),
                });
            }
        }
    }

    let mut guard = snapshot.write().unwrap_or_else(PoisonError::into_inner);
    for entry in entries {
        guard.insert(entry);
    }
    for warning in warnings {
        guard.push_warning(warning);
    }

    Ok(subdirectories)
}

fn is_ignored(path: &Path, ignored_roots: &[PathBuf]) -> bool {
    ignored_roots.iter().any(|ignored| path.starts_with(ignored))
}

fn canonical_or_original(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    struct Counters {
        cancel: AtomicBool,
        files: AtomicUsize,
        dirs: AtomicUsize,
    }

    impl Counters {
        fn new() -> Self {
            Self {
                cancel: AtomicBool::new(false),
                files: AtomicUsize::new(0),
                dirs: AtomicUsize::new(0),
            }
        }

        fn context<'a>(&'a self, root: &'a Path, ignored: &'a [PathBuf]) -> WalkContext<'a> {
            WalkContext {
                root,
                ignored_roots: ignored,
                cancel: &self.cancel,
                scanned_files: &self.files,
                scanned_dirs: &self.dirs,
            }
        }
    }

    #[test]
    fn walk_indexes_files_and_subdirectories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        File::create(temp.path().join("top.txt")).unwrap();
        File::create(temp.path().join("sub/nested.txt")).unwrap();

        let counters = Counters::new();
        let snapshot = RwLock::new(IndexSnapshot::new());
        let outcome = walk_into(&counters.context(temp.path(), &[]), &snapshot);

        assert_eq!(outcome, WalkOutcome::Finished);
        let snapshot = snapshot.read().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.entries_with_name_containing("nested.txt").count(), 1);
        assert_eq!(counters.files.load(Ordering::Relaxed), 2);
        assert_eq!(counters.dirs.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn walk_skips_ignored_subtrees() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("include")).unwrap();
        fs::create_dir(temp.path().join("exclude")).unwrap();
        File::create(temp.path().join("include/a.txt")).unwrap();
        File::create(temp.path().join("exclude/b.txt")).unwrap();

        let ignored = vec![temp.path().join("exclude")];
        let counters = Counters::new();
        let snapshot = RwLock::new(IndexSnapshot::new());
        walk_into(&counters.context(temp.path(), &ignored), &snapshot);

        let snapshot = snapshot.read().unwrap();
        assert_eq!(snapshot.entries_with_name_containing("a.txt").count(), 1);
        assert_eq!(snapshot.entries_with_name_containing("b.txt").count(), 0);
        assert_eq!(snapshot.entries_with_name_containing("exclude").count(), 0);
    }

    #[test]
    fn pre_cancelled_walk_indexes_nothing() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("a.txt")).unwrap();

        let counters = Counters::new();
        counters.cancel.store(true, Ordering::SeqCst);
        let snapshot = RwLock::new(IndexSnapshot::new());
        let outcome = walk_into(&counters.context(temp.path(), &[]), &snapshot);

        assert_eq!(outcome, WalkOutcome::Cancelled);
        assert!(snapshot.read().unwrap().is_empty());
    }

    #[test]
    fn unreachable_root_fails_the_walk() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("gone");

        let counters = Counters::new();
        let snapshot = RwLock::new(IndexSnapshot::new());
        let outcome = walk_into(&counters.context(&missing, &[]), &snapshot);

        assert_eq!(outcome, WalkOutcome::RootUnreachable);
        assert!(snapshot.read().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_skipped_with_a_warning() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        File::create(temp.path().join("docs/report.pdf")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("docs"), temp.path().join("docs/old"))
            .unwrap();

        let counters = Counters::new();
        let snapshot = RwLock::new(IndexSnapshot::new());
        let outcome = walk_into(&counters.context(temp.path(), &[]), &snapshot);

        assert_eq!(outcome, WalkOutcome::Finished);
        let snapshot = snapshot.read().unwrap();
        assert_eq!(snapshot.entries_with_name_containing("report.pdf").count(), 1);
        assert_eq!(
            snapshot
                .warnings()
                .iter()
                .filter(|warning| matches!(warning, ScanWarning::CycleSkipped { .. }))
                .count(),
            1
        );
    }
}
