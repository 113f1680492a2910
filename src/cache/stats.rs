//! Cache Statistics Module
//!
//! Tracks local cache performance: hits, misses, evictions and lazy expirations.

use serde::Serialize;

// == Cache Stats ==
/// Counters for the in-process cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups served from the cache
    pub hits: u64,
    /// Number of lookups that found nothing live (absent or expired)
    pub misses: u64,
    /// Number of entries dropped to make room for a new key
    pub evictions: u64,
    /// Number of expired entries removed when a lookup touched them
    pub expirations: u64,
    /// Current number of entries, expired-but-untouched ones included
    pub total_entries: usize,
    /// Fixed capacity of the cache
    pub capacity: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates zeroed counters for a cache of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Counts an expired entry found during a lookup. The lookup itself is
    /// recorded separately as a miss.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
