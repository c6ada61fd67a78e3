//! Scan lifecycle: background workers, handles, and the scan registry.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread;
use std::time::Instant;

use super::data::IndexSnapshot;
use super::walk::{walk_into, WalkContext, WalkOutcome};
use crate::error::ScanError;

/// Lifecycle of one scan.
///
/// `Failed` occurs only when the root itself was unreachable and is the one
/// state whose snapshot is unusable; a cancelled scan's snapshot stays
/// valid, just incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScanState {
    Running = 0,
    Completed = 1,
    Cancelled = 2,
    Failed = 3,
}

impl ScanState {
    fn load(atomic: &AtomicU8) -> Self {
        match atomic.load(Ordering::SeqCst) {
            1 => Self::Completed,
            2 => Self::Cancelled,
            3 => Self::Failed,
            _ => Self::Running,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "scanning",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Running
    }
}

/// State shared between a scan's worker thread and its handles.
#[derive(Debug)]
struct ScanShared {
    root: PathBuf,
    state: AtomicU8,
    cancel: AtomicBool,
    scanned_files: AtomicUsize,
    scanned_dirs: AtomicUsize,
    snapshot: RwLock<IndexSnapshot>,
    finished: Mutex<bool>,
    finished_signal: Condvar,
}

/// Cloneable handle to one scan's progressive state.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    shared: Arc<ScanShared>,
}

impl ScanHandle {
    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    pub fn state(&self) -> ScanState {
        ScanState::load(&self.shared.state)
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Requests cooperative cancellation; the worker stops at the next
    /// directory boundary and leaves the snapshot as populated.
    pub fn cancel(&self) {
        self.shared.cancel.store(true, Ordering::SeqCst);
    }

    pub fn scanned_files(&self) -> usize {
        self.shared.scanned_files.load(Ordering::Relaxed)
    }

    pub fn scanned_dirs(&self) -> usize {
        self.shared.scanned_dirs.load(Ordering::Relaxed)
    }

    /// Runs `reader` against the current snapshot under the read lock.
    ///
    /// The snapshot may still be growing; readers see a valid prefix of the
    /// final index. The single writer inserts whole directories, so a
    /// recovered poisoned guard is still structurally intact.
    pub fn with_snapshot<T>(&self, reader: impl FnOnce(&IndexSnapshot) -> T) -> T {
        let guard = self
            .shared
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        reader(&guard)
    }

    /// Blocks until the scan reaches a terminal state.
    pub fn wait(&self) {
        let mut finished = self
            .shared
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !*finished {
            finished = self
                .shared
                .finished_signal
                .wait(finished)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Registry of scans, at most one live scan per root.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    scans: Mutex<HashMap<PathBuf, ScanHandle>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `root`, spawning a scan only if the root has
    /// never been scanned. Finished scans keep serving their snapshot; the
    /// index is long-lived and rebuilt only through [`Self::rescan`].
    pub fn ensure_scan(
        &self,
        root: &Path,
        ignored_roots: &[PathBuf],
    ) -> Result<ScanHandle, ScanError> {
        let mut scans = self.lock();
        if let Some(existing) = scans.get(root) {
            return Ok(existing.clone());
        }
        let handle = spawn_scan(root, ignored_roots)?;
        scans.insert(root.to_path_buf(), handle.clone());
        Ok(handle)
    }

    /// Starts a scan of `root`.
    ///
    /// A scan already running for the same root is returned as-is instead
    /// of duplicating work; a finished one is replaced by a fresh scan.
    pub fn start_scan(
        &self,
        root: &Path,
        ignored_roots: &[PathBuf],
    ) -> Result<ScanHandle, ScanError> {
        let mut scans = self.lock();
        if let Some(existing) = scans.get(root) {
            if !existing.is_finished() {
                return Ok(existing.clone());
            }
        }
        let handle = spawn_scan(root, ignored_roots)?;
        scans.insert(root.to_path_buf(), handle.clone());
        Ok(handle)
    }

    /// Cancels any live scan for `root` and starts a fresh one, discarding
    /// the previous snapshot.
    pub fn rescan(
        &self,
        root: &Path,
        ignored_roots: &[PathBuf],
    ) -> Result<ScanHandle, ScanError> {
        let mut scans = self.lock();
        if let Some(existing) = scans.get(root) {
            existing.cancel();
        }
        let handle = spawn_scan(root, ignored_roots)?;
        scans.insert(root.to_path_buf(), handle.clone());
        Ok(handle)
    }

    /// The most recent scan for `root`, live or finished.
    pub fn current_scan(&self, root: &Path) -> Option<ScanHandle> {
        self.lock().get(root).cloned()
    }

    /// Cancels the live scan for `root`. Returns whether one was running.
    pub fn cancel(&self, root: &Path) -> bool {
        match self.lock().get(root) {
            Some(handle) if !handle.is_finished() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, ScanHandle>> {
        // The registry holds cheap handle clones; recovery after a panicked
        // holder is safe.
        self.scans.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Validates `root` and spawns the background worker for one scan.
fn spawn_scan(root: &Path, ignored_roots: &[PathBuf]) -> Result<ScanHandle, ScanError> {
    let metadata = fs::metadata(root).map_err(|source| ScanError::RootUnreachable {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::RootNotADirectory(root.to_path_buf()));
    }

    let shared = Arc::new(ScanShared {
        root: root.to_path_buf(),
        state: AtomicU8::new(ScanState::Running as u8),
        cancel: AtomicBool::new(false),
        scanned_files: AtomicUsize::new(0),
        scanned_dirs: AtomicUsize::new(0),
        snapshot: RwLock::new(IndexSnapshot::new()),
        finished: Mutex::new(false),
        finished_signal: Condvar::new(),
    });

    let ignored_roots = ignored_roots.to_vec();
    let worker = shared.clone();
    thread::spawn(move || {
        let started = Instant::now();
        let context = WalkContext {
            root: &worker.root,
            ignored_roots: &ignored_roots,
            cancel: &worker.cancel,
            scanned_files: &worker.scanned_files,
            scanned_dirs: &worker.scanned_dirs,
        };
        let outcome = walk_into(&context, &worker.snapshot);
        let state = match outcome {
            WalkOutcome::Finished => ScanState::Completed,
            WalkOutcome::Cancelled => ScanState::Cancelled,
            WalkOutcome::RootUnreachable => ScanState::Failed,
        };
        worker.state.store(state as u8, Ordering::SeqCst);

        let (entries, warnings) = {
            let snapshot = worker
                .snapshot
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            (snapshot.len(), snapshot.warnings().len())
        };
        log::info!(
            "scan {} root={} entries={} files={} dirs={} warnings={} elapsed_ms={}",
            state.as_str(),
            worker.root.display(),
            entries,
            worker.scanned_files.load(Ordering::Relaxed),
            worker.scanned_dirs.load(Ordering::Relaxed),
            warnings,
            started.elapsed().as_millis(),
        );

        let mut finished = worker
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *finished = true;
        worker.finished_signal.notify_all();
    });

    Ok(ScanHandle { shared })
}
