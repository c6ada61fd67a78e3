//! The boundary facade the UI collaborator talks to.
//!
//! Three requests come in (list a directory, search the indexed tree, open
//! a path) and the facade routes them through the cache, the index
//! builder, and the opener. It holds no "current directory"; every
//! operation takes explicit paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::{DirectoryCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
use crate::cancel::{CancelToken, SearchVersionTracker};
use crate::entry::Entry;
use crate::error::{DirectoryError, OpenError, ScanError, StatError};
use crate::index::{IndexBuilder, ScanState};
use crate::listing::normalize_directory_path;
use crate::opener::open_path;
use crate::search::{search_snapshot, SearchQuery};

/// Engine configuration. `root` is the tree `search_files` serves.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub root: PathBuf,
    /// Subtree prefixes excluded from indexing (cloud placeholders, system
    /// volumes and the like).
    pub ignored_roots: Vec<PathBuf>,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl ExplorerConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignored_roots: Vec::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_ignored_roots(mut self, ignored_roots: Vec<PathBuf>) -> Self {
        self.ignored_roots = ignored_roots;
        self
    }

    pub fn with_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = ttl;
        self
    }
}

/// One search response.
///
/// `version` echoes the caller's search version so superseded responses can
/// be dropped regardless of completion order; `index_state` lets the UI
/// show an "initializing" surface while the first scan is still running.
#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub entries: Vec<Entry>,
    pub version: u64,
    pub index_state: String,
    pub scanned_files: usize,
    pub scanned_dirs: usize,
    pub warning_count: usize,
}

/// Index status payload surfaced to the UI.
#[derive(Debug, Serialize)]
pub struct IndexStatus {
    pub state: String,
    pub root: String,
    pub indexed_entries: usize,
    pub scanned_files: usize,
    pub scanned_dirs: usize,
    pub warning_count: usize,
}

/// The filesystem index and search engine.
#[derive(Debug)]
pub struct Explorer {
    config: ExplorerConfig,
    cache: DirectoryCache,
    builder: IndexBuilder,
    search_versions: SearchVersionTracker,
}

impl Explorer {
    pub fn new(config: ExplorerConfig) -> Self {
        let cache = DirectoryCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            config,
            cache,
            builder: IndexBuilder::new(),
            search_versions: SearchVersionTracker::new(),
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Ordered direct children of `path`, served through the cache.
    ///
    /// Never waits on the index builder; the only I/O is the listing itself
    /// on a cache miss.
    pub fn list_directory_contents(&self, path: &Path) -> Result<Arc<Vec<Entry>>, DirectoryError> {
        self.cache.get_or_list(path)
    }

    /// Drops the memoized listing for `path` and lists afresh.
    pub fn refresh_directory(&self, path: &Path) -> Result<Arc<Vec<Entry>>, DirectoryError> {
        self.cache.invalidate(path);
        self.cache.get_or_list(path)
    }

    /// Allocates the version for the next search; in-flight searches
    /// holding older versions observe it and bail out.
    pub fn next_search_version(&self) -> u64 {
        self.search_versions.next_version()
    }

    /// Searches the indexed root by name substring and extension.
    ///
    /// The first call lazily starts the background scan; until it
    /// completes, results reflect whatever has been indexed so far and
    /// `index_state` reads `"scanning"`. `version` ties the call to
    /// [`Self::next_search_version`]; `None` runs uncancellable. Returns
    /// `Ok(None)` when the search was superseded mid-run.
    pub fn search_files(
        &self,
        query: &SearchQuery,
        version: Option<u64>,
    ) -> Result<Option<SearchResults>, ScanError> {
        let handle = self
            .builder
            .ensure_scan(&self.config.root, &self.config.ignored_roots)?;
        let token = match version {
            Some(version) => self.search_versions.token_for_version(version),
            None => CancelToken::noop(),
        };

        let outcome = handle.with_snapshot(|snapshot| {
            search_snapshot(snapshot, query, &token)
                .map(|entries| (entries, snapshot.warnings().len()))
        });
        let Some((entries, warning_count)) = outcome else {
            return Ok(None);
        };

        Ok(Some(SearchResults {
            entries,
            version: token.version(),
            index_state: handle.state().as_str().to_string(),
            scanned_files: handle.scanned_files(),
            scanned_dirs: handle.scanned_dirs(),
            warning_count,
        }))
    }

    /// Dispatches `path` to the OS default application.
    pub fn open_file(&self, path: &Path) -> Result<(), OpenError> {
        open_path(path)
    }

    /// Metadata for a single path.
    pub fn entry_metadata(&self, path: &Path) -> Result<Entry, StatError> {
        Entry::from_path(path)
    }

    /// Summed size of the indexed entries under `path`. Zero until the
    /// index holds something there.
    pub fn directory_size(&self, path: &Path) -> u64 {
        let prefix = normalize_directory_path(path);
        let prefix = prefix.to_string_lossy();
        match self.builder.current_scan(&self.config.root) {
            Some(handle) => handle.with_snapshot(|snapshot| snapshot.size_under(&prefix)),
            None => 0,
        }
    }

    /// Whether the index holds any entries yet.
    pub fn is_indexed(&self) -> bool {
        self.builder
            .current_scan(&self.config.root)
            .map(|handle| handle.with_snapshot(|snapshot| !snapshot.is_empty()))
            .unwrap_or(false)
    }

    /// Current index status, `"idle"` before the first scan starts.
    pub fn index_status(&self) -> IndexStatus {
        let root = self.config.root.to_string_lossy().into_owned();
        match self.builder.current_scan(&self.config.root) {
            Some(handle) => {
                let (indexed_entries, warning_count) =
                    handle.with_snapshot(|snapshot| (snapshot.len(), snapshot.warnings().len()));
                IndexStatus {
                    state: handle.state().as_str().to_string(),
                    root,
                    indexed_entries,
                    scanned_files: handle.scanned_files(),
                    scanned_dirs: handle.scanned_dirs(),
                    warning_count,
                }
            }
            None => IndexStatus {
                state: "idle".to_string(),
                root,
                indexed_entries: 0,
                scanned_files: 0,
                scanned_dirs: 0,
                warning_count: 0,
            },
        }
    }

    /// Cancels a live scan of the configured root. Returns whether one was
    /// running.
    pub fn cancel_scan(&self) -> bool {
        self.builder.cancel(&self.config.root)
    }

    /// Discards the index, starts a fresh scan, and clears the directory
    /// cache. The explicit-refresh path.
    pub fn rescan(&self) -> Result<IndexStatus, ScanError> {
        self.builder
            .rescan(&self.config.root, &self.config.ignored_roots)?;
        self.cache.clear();
        Ok(self.index_status())
    }

    /// Blocks until the initial scan of the configured root finishes.
    ///
    /// An affordance for embedders that want a ready index before first
    /// render; the engine itself never requires it.
    pub fn wait_for_initial_scan(&self) -> Result<ScanState, ScanError> {
        let handle = self
            .builder
            .ensure_scan(&self.config.root, &self.config.ignored_roots)?;
        handle.wait();
        Ok(handle.state())
    }
}
