use crate::types::Vector;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct PinnedState {
    keys: HashSet<String>,
    vectors: HashMap<String, Vector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub pinned: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Normalized embeddings keyed by exact text.
///
/// Unpinned entries live in an LRU `moka` cache bounded by `capacity`.
/// Vectors for pinned keys are held apart from it, so eviction never reaches
/// them and the cache may exceed its capacity by the number of pinned keys.
pub struct EmbeddingCache {
    entries: Cache<String, Vector>,
    pinned: Mutex<PinnedState>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    /// `capacity == 0` means unbounded
    pub fn new(capacity: usize) -> Self {
        let entries = if capacity == 0 {
            Cache::builder().build()
        } else {
            Cache::builder()
                .max_capacity(capacity as u64)
                .eviction_policy(EvictionPolicy::lru())
                .eviction_listener(|key, _, cause| {
                    log::debug!("Cached embedding for {:?} removed ({:?})", key, cause);
                })
                .build()
        };

        Self {
            entries,
            pinned: Mutex::new(PinnedState::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock_pinned(&self) -> MutexGuard<'_, PinnedState> {
        // Pin changes move whole entries, so a poisoned guard is still consistent.
        self.pinned.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_many(&self, keys: &[String]) -> Vec<Option<Vector>> {
        let pinned = self.lock_pinned();
        keys.iter()
            .map(|key| {
                let hit = pinned
                    .vectors
                    .get(key)
                    .cloned()
                    .or_else(|| self.entries.get(key));
                let counter = if hit.is_some() { &self.hits } else { &self.misses };
                counter.fetch_add(1, Ordering::Relaxed);
                hit
            })
            .collect()
    }

    /// Insert a completed batch; vectors for pinned keys bypass the LRU.
    pub fn insert_batch(&self, items: Vec<(String, Vector)>) {
        let mut pinned = self.lock_pinned();
        for (key, vector) in items {
            if pinned.keys.contains(&key) {
                pinned.vectors.insert(key, vector);
            } else {
                self.entries.insert(key, vector);
            }
        }
        drop(pinned);

        if self.capacity > 0 {
            self.entries.run_pending_tasks();
        }
    }

    /// Currently pinned keys, in no particular order.
    pub fn pinned_keys(&self) -> Vec<String> {
        self.lock_pinned().keys.iter().cloned().collect()
    }

    /// Add `keys` to the pinned set, keeping the existing pins.
    pub fn pin_also(&self, keys: &[String]) {
        let mut pinned = self.lock_pinned();
        for key in keys {
            if pinned.keys.insert(key.clone()) {
                if let Some(vector) = self.entries.remove(key) {
                    pinned.vectors.insert(key.clone(), vector);
                }
            }
        }
    }

    /// Replace the pinned set. Keys that stop being pinned return to the LRU.
    pub fn set_pinned(&self, keys: &[String]) {
        let mut pinned = self.lock_pinned();
        let next: HashSet<String> = keys.iter().cloned().collect();

        let released: Vec<String> = pinned
            .vectors
            .keys()
            .filter(|key| !next.contains(*key))
            .cloned()
            .collect();
        for key in released {
            if let Some(vector) = pinned.vectors.remove(&key) {
                self.entries.insert(key, vector);
            }
        }

        for key in &next {
            if !pinned.vectors.contains_key(key) {
                if let Some(vector) = self.entries.remove(key) {
                    pinned.vectors.insert(key.clone(), vector);
                }
            }
        }
        pinned.keys = next;
        drop(pinned);

        if self.capacity > 0 {
            self.entries.run_pending_tasks();
        }
    }

    pub fn is_pinned(&self, key: &str) -> bool {
        self.lock_pinned().keys.contains(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock_pinned().vectors.contains_key(key) || self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize + self.lock_pinned().vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        CacheStats {
            entries: self.entries.entry_count() as usize,
            pinned: self.lock_pinned().vectors.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
