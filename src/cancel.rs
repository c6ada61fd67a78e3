//! Search supersession: version tracking and cancellation tokens.
//!
//! A search box fires one logical query per keystroke burst. The caller
//! allocates a fresh version per query; tokens minted for older versions
//! report as superseded, so an in-flight search for "a" stops doing work
//! once "ab" arrives. Only the newest call's result is authoritative.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How often tight loops should check whether their search was superseded.
/// A power of two, so the modulo is a bitwise AND.
pub const CANCEL_CHECK_INTERVAL: usize = 0x400; // 1,024

/// Tracks the active search version.
///
/// `next_version()` supersedes every in-flight search holding an older
/// token; the engine echoes the version back so callers can drop stale
/// responses regardless of completion order.
#[derive(Debug, Default)]
pub struct SearchVersionTracker {
    active_version: Arc<AtomicU64>,
}

impl SearchVersionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the active version and returns it.
    pub fn next_version(&self) -> u64 {
        self.active_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current active version without incrementing.
    pub fn current_version(&self) -> u64 {
        self.active_version.load(Ordering::SeqCst)
    }

    /// Creates a token tied to `version`.
    pub fn token_for_version(&self, version: u64) -> CancelToken {
        CancelToken {
            active_version: Arc::clone(&self.active_version),
            version,
        }
    }
}

/// A token carried through one search.
#[derive(Debug, Clone)]
pub struct CancelToken {
    active_version: Arc<AtomicU64>,
    version: u64,
}

impl CancelToken {
    /// A token that is never superseded, for callers that do not cancel.
    pub fn noop() -> Self {
        Self {
            active_version: Arc::new(AtomicU64::new(0)),
            version: 0,
        }
    }

    /// `Some(())` while this is still the newest search, `None` once
    /// superseded. The `Option` shape lets loops bail out with `?`.
    #[inline]
    pub fn is_active(&self) -> Option<()> {
        (self.version == self.active_version.load(Ordering::Relaxed)).then_some(())
    }

    /// Sparse variant: only touches the atomic every
    /// [`CANCEL_CHECK_INTERVAL`] iterations.
    #[inline]
    pub fn is_active_sparse(&self, counter: usize) -> Option<()> {
        if counter & (CANCEL_CHECK_INTERVAL - 1) == 0 {
            self.is_active()
        } else {
            Some(())
        }
    }

    /// The version this token was minted for.
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::noop()
    }
}
