//! Insert-if-absent result cache.
//!
//! Eviction order is fixed at insertion time: the oldest-inserted key is
//! evicted first, reads never refresh recency, and inserting a key that is
//! already present is a no-op.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::model::SummaryResult;

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, SummaryResult>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

/// Bounded cache of summaries keyed by `owner/repo`.
///
/// Constructed once at startup and shared behind an `Arc`.
#[derive(Debug)]
pub struct SummaryCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl SummaryCache {
    /// Create a cache holding at most `capacity` entries. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
        }
    }

    pub fn from_config(config: &reposum_config::CacheConfig) -> Self {
        Self::new(config.max_size)
    }

    // A panic while holding the lock cannot leave the map and queue out of
    // step (each mutation is a single push or pop pair), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<SummaryResult> {
        self.lock().entries.get(key).cloned()
    }

    /// Insert `value` unless `key` is already cached.
    ///
    /// Returns `true` if the value was stored.
    pub fn insert_if_absent(&self, key: &str, value: SummaryResult) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let mut inner = self.lock();
        if inner.entries.contains_key(key) {
            return false;
        }
        if inner.entries.len() >= self.capacity
            && let Some(oldest) = inner.order.pop_front()
        {
            inner.entries.remove(&oldest);
            debug!(key = %oldest, "Evicted cached summary");
        }
        inner.entries.insert(key.to_string(), value);
        inner.order.push_back(key.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached keys, oldest first.
    pub fn keys(&self) -> Vec<String> {
        self.lock().order.iter().cloned().collect()
    }
}
