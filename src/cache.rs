//! Memoized directory listings.
//!
//! Repeated navigation (Up, Home, breadcrumbs) re-lists the same handful of
//! directories; this cache answers those from memory. Entries expire by TTL
//! or explicit invalidation, and least-recently-used listings are evicted
//! once the bounded capacity is exceeded.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::entry::Entry;
use crate::error::DirectoryError;
use crate::listing::{list_directory, normalize_directory_path};

/// Default bound on memoized listings. A tunable, not a correctness knob.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Default listing freshness window.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct CachedListing {
    entries: Arc<Vec<Entry>>,
    fetched_at: Instant,
}

/// LRU + TTL cache in front of the directory lister.
#[derive(Debug)]
pub struct DirectoryCache {
    listings: Mutex<LruCache<PathBuf, CachedListing>>,
    ttl: Duration,
}

impl DirectoryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            listings: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Serves a fresh cached listing, or delegates to the lister and
    /// memoizes the result. Errors are never cached.
    ///
    /// The lock is not held across the filesystem read, so a slow listing
    /// never blocks cache hits for other directories.
    pub fn get_or_list(&self, path: &Path) -> Result<Arc<Vec<Entry>>, DirectoryError> {
        let key = normalize_directory_path(path);

        {
            let mut listings = self.lock()?;
            if let Some(cached) = listings.get(&key) {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&cached.entries));
                }
            }
        }

        let entries = Arc::new(list_directory(path)?);
        self.lock()?.put(
            key,
            CachedListing {
                entries: Arc::clone(&entries),
                fetched_at: Instant::now(),
            },
        );
        Ok(entries)
    }

    /// Drops the memoized listing for `path`, if any.
    pub fn invalidate(&self, path: &Path) {
        if let Ok(mut listings) = self.listings.lock() {
            listings.pop(&normalize_directory_path(path));
        }
    }

    /// Drops every memoized listing.
    pub fn clear(&self) {
        if let Ok(mut listings) = self.listings.lock() {
            listings.clear();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<PathBuf, CachedListing>>, DirectoryError> {
        self.listings
            .lock()
            .map_err(|_| DirectoryError::Internal("directory cache lock poisoned".to_string()))
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn hit_and_miss_return_identical_listings() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("a.txt")).unwrap();
        File::create(temp.path().join("b.txt")).unwrap();

        let cache = DirectoryCache::new(8, Duration::from_secs(60));
        let miss = cache.get_or_list(temp.path()).unwrap();
        let hit = cache.get_or_list(temp.path()).unwrap();

        assert_eq!(*miss, *hit);
        assert!(Arc::ptr_eq(&miss, &hit));
    }

    #[test]
    fn fresh_listing_is_served_from_memory() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("a.txt")).unwrap();

        let cache = DirectoryCache::new(8, Duration::from_secs(60));
        cache.get_or_list(temp.path()).unwrap();

        File::create(temp.path().join("b.txt")).unwrap();
        // Within the TTL, the new file is not visible.
        assert_eq!(cache.get_or_list(temp.path()).unwrap().len(), 1);
    }

    #[test]
    fn invalidate_forces_a_fresh_listing() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("a.txt")).unwrap();

        let cache = DirectoryCache::new(8, Duration::from_secs(60));
        cache.get_or_list(temp.path()).unwrap();

        File::create(temp.path().join("b.txt")).unwrap();
        cache.invalidate(temp.path());
        assert_eq!(cache.get_or_list(temp.path()).unwrap().len(), 2);
    }

    #[test]
    fn least_recently_used_listing_is_evicted() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        File::create(first.path().join("a.txt")).unwrap();

        let cache = DirectoryCache::new(1, Duration::from_secs(60));
        cache.get_or_list(first.path()).unwrap();
        cache.get_or_list(second.path()).unwrap();

        // `first` was evicted, so its next listing is fresh.
        File::create(first.path().join("b.txt")).unwrap();
        assert_eq!(cache.get_or_list(first.path()).unwrap().len(), 2);
    }

    #[test]
    fn zero_ttl_always_relists() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("a.txt")).unwrap();

        let cache = DirectoryCache::new(8, Duration::ZERO);
        cache.get_or_list(temp.path()).unwrap();

        File::create(temp.path().join("b.txt")).unwrap();
        assert_eq!(cache.get_or_list(temp.path()).unwrap().len(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let temp = TempDir::new().unwrap();
        let late = temp.path().join("late");

        let cache = DirectoryCache::new(8, Duration::from_secs(60));
        assert!(matches!(
            cache.get_or_list(&late),
            Err(DirectoryError::NotFound(_))
        ));

        std::fs::create_dir(&late).unwrap();
        File::create(late.join("a.txt")).unwrap();
        assert_eq!(cache.get_or_list(&late).unwrap().len(), 1);
    }
}
