//! Cache Store Module
//!
//! The cache engine: HashMap storage combined with LRU recency tracking,
//! capacity enforcement and optional snapshot persistence.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::cache::{snapshot, CacheKey, CacheStats, CachedResponse, LruTracker, SnapshotEntry};

// == Cache Store ==
/// Bounded key -> response store with LRU eviction.
///
/// With a capacity, `set` keeps the entry count at or below it by
/// evicting the least recently used entry, and an existing key is never
/// replaced (first write wins). Without one the store is unbounded: no
/// recency tracking, `set` overwrites.
///
/// Snapshot writes happen synchronously inside `set`, so a slow disk
/// throttles cache mutations for the whole process.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<CacheKey, CachedResponse>,
    /// Recency order, maintained only for bounded stores
    lru: LruTracker,
    /// Cache effectiveness counters
    stats: CacheStats,
    /// Maximum number of entries; `None` = unbounded
    capacity: Option<NonZeroUsize>,
    /// Snapshot file location; `None` disables persistence
    snapshot_path: Option<PathBuf>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store, hydrating it from the snapshot file if one exists.
    ///
    /// A snapshot that fails to open or decode is logged and ignored; the
    /// store starts empty rather than aborting startup.
    pub fn new(capacity: Option<NonZeroUsize>, snapshot_path: Option<PathBuf>) -> Self {
        let mut store = Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity,
            snapshot_path,
        };
        store.hydrate();
        store
    }

    // == Get ==
    /// Looks up a key, promoting it to most recently used on a hit.
    ///
    /// A miss has no side effect beyond the miss counter.
    pub fn get(&mut self, key: &CacheKey) -> Option<CachedResponse> {
        match self.entries.get(key) {
            Some(response) => {
                if self.capacity.is_some() {
                    self.lru.touch(key);
                }
                self.stats.record_hit();
                Some(response.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Inserts a captured response under `key`.
    ///
    /// Bounded store: a key that is already present is left untouched
    /// (first write wins); otherwise least recently used entries are
    /// evicted until the new entry fits, and it is inserted at the
    /// most-recently-used position. Unbounded store: always inserts,
    /// overwriting any previous value.
    ///
    /// After every insert the full entry set is written to the snapshot
    /// file; a failed write is logged and the store keeps serving from
    /// memory.
    pub fn set(&mut self, key: CacheKey, response: CachedResponse) {
        match self.capacity {
            Some(capacity) => {
                if self.entries.contains_key(&key) {
                    return;
                }
                while self.entries.len() >= capacity.get() {
                    // The tracker mirrors the map, so it cannot run dry
                    // while entries remain.
                    let Some(evicted) = self.lru.evict_oldest() else {
                        break;
                    };
                    self.entries.remove(&evicted);
                    self.stats.record_eviction();
                }
                self.lru.touch(&key);
                self.entries.insert(key, response);
            }
            None => {
                self.entries.insert(key, response);
            }
        }
        self.stats.record_store();
        self.stats.set_entries(self.entries.len());
        self.persist();
    }

    // == Clear ==
    /// Empties the store and removes the snapshot file.
    ///
    /// A missing snapshot file is not an error; any other removal failure
    /// is logged, never fatal.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_entries(0);
        if let Some(path) = &self.snapshot_path {
            if let Err(err) = snapshot::delete(path) {
                warn!("failed to remove snapshot: {err:#}");
            }
        }
    }

    // == Stats ==
    /// Returns a copy of the current counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Persistence ==
    /// Writes the full entry set to the snapshot file, oldest-first so
    /// hydration replays the original recency order.
    fn persist(&self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let entries: Vec<SnapshotEntry> = match self.capacity {
            Some(_) => self
                .lru
                .iter_oldest_first()
                .filter_map(|key| {
                    self.entries.get(key).map(|response| SnapshotEntry {
                        key: key.clone(),
                        response: response.clone(),
                    })
                })
                .collect(),
            // Unbounded stores have no recency order to preserve.
            None => self
                .entries
                .iter()
                .map(|(key, response)| SnapshotEntry {
                    key: key.clone(),
                    response: response.clone(),
                })
                .collect(),
        };
        if let Err(err) = snapshot::save(path, &entries) {
            warn!("snapshot write failed, cache continues in memory only: {err:#}");
        }
    }

    /// Rebuilds map and recency order from the snapshot file.
    fn hydrate(&mut self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let entries = match snapshot::load(path) {
            Ok(Some(entries)) => entries,
            Ok(None) => return,
            Err(err) => {
                warn!("snapshot load failed, starting with an empty cache: {err:#}");
                return;
            }
        };

        let loaded = entries.len();
        for entry in entries {
            if self.capacity.is_some() {
                self.lru.touch(&entry.key);
            }
            self.entries.insert(entry.key, entry.response);
        }

        // A snapshot written under a larger capacity may not fit.
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity.get() {
                let Some(evicted) = self.lru.evict_oldest() else {
                    break;
                };
                self.entries.remove(&evicted);
            }
        }

        self.stats.set_entries(self.entries.len());
        info!(
            entries = self.entries.len(),
            loaded, "cache hydrated from snapshot"
        );
    }
}
