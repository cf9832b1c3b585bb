//! Exact-match cache
//!
//! Single-key lookup consulted before the similarity engine. Each entry
//! remembers the neighbour count it was computed with and only answers
//! queries asking for the same count. Entries expire after a TTL and the
//! oldest entry is evicted when the cache is full.

use dashmap::DashMap;
use quip_core::Classification;
use std::time::{Duration, Instant};

/// Cached classification with its neighbour count and insertion time
#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    classification: Classification,
    top_k: Option<usize>,
    inserted_at: Instant,
}

/// In-memory exact-match cache keyed by content fingerprint
#[derive(Debug)]
pub struct ExactCache {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
    ttl: Duration,
}

impl ExactCache {
    /// Create a cache holding at most `max_entries` entries for `ttl` each.
    ///
    /// A capacity of zero disables caching.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            ttl,
        }
    }

    /// Look up a live entry computed with the same `top_k`, dropping it if
    /// it has expired
    pub fn get(&self, key: &str, top_k: Option<usize>) -> Option<Classification> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return (entry.top_k == top_k).then_some(entry.classification);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            tracing::debug!(key = key, "Exact cache entry expired");
        }
        None
    }

    /// Store a classification, evicting the oldest entry at capacity
    pub fn insert(
        &self,
        key: impl Into<String>,
        top_k: Option<usize>,
        classification: Classification,
    ) {
        if self.max_entries == 0 {
            return;
        }

        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.prune_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                classification,
                top_k,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop the entry for `key`, if any
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove expired entries (called periodically)
    pub fn prune_expired(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries, including any not yet pruned
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().inserted_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            tracing::debug!(key = %key, "Evicted oldest exact cache entry");
        }
    }
}
