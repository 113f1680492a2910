//! Expiring LRU Cache Module
//!
//! Bounded in-process cache combining a hash index, an arena-backed recency
//! list and a uniform per-entry TTL.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::trace;

use crate::cache::{CacheEntry, CacheStats, LruList};
use crate::clock::{Clock, SystemClock};

// == Inner State ==
/// Everything guarded by the cache mutex.
///
/// `index` maps each key to its slot in `order`; every slot in `order` holds
/// the key that points back at it.
struct Inner<K, V> {
    index: HashMap<K, usize>,
    order: LruList<(K, CacheEntry<V>)>,
    stats: CacheStats,
}

// == Expiring LRU Cache ==
/// Fixed-capacity, thread-safe key/value cache with LRU eviction and lazy
/// TTL expiry.
///
/// Every `put` (new or existing key) stamps the entry with `now + ttl`.
/// Expired entries are only discovered by `get`; until then they keep their
/// slot and are eligible for LRU eviction like any other entry.
///
/// All operations take one coarse mutex for their full duration and never
/// perform I/O, so the critical sections stay short.
pub struct ExpiringLruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: NonZeroUsize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> ExpiringLruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries, each valid for
    /// `ttl` after its last write.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(capacity: NonZeroUsize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let cap = capacity.get();
        Self {
            inner: Mutex::new(Inner {
                index: HashMap::with_capacity(cap),
                order: LruList::with_capacity(cap),
                stats: CacheStats::new(cap),
            }),
            capacity,
            ttl,
            clock,
        }
    }

    // == Get ==
    /// Returns a clone of the live value for `key`.
    ///
    /// A hit marks the entry most recently used. An expired entry is removed
    /// before the miss is reported.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let Some(&idx) = inner.index.get(key) else {
            inner.stats.record_miss();
            return None;
        };

        let expired = inner
            .order
            .get(idx)
            .map_or(true, |(_, entry)| entry.is_expired(now));

        if expired {
            inner.order.remove(idx);
            inner.index.remove(key);
            inner.stats.record_expiration();
            inner.stats.record_miss();
            trace!(slot = idx, "dropped expired entry on lookup");
            return None;
        }

        inner.order.move_to_back(idx);
        inner.stats.record_hit();
        inner.order.get(idx).map(|(_, entry)| entry.value.clone())
    }

    // == Put ==
    /// Inserts or refreshes `key`.
    ///
    /// Refreshing an existing key replaces its value, restarts its TTL and
    /// marks it most recently used without evicting anything. Inserting a
    /// new key into a full cache first evicts the least recently used entry,
    /// whose key is returned.
    pub fn put(&self, key: K, value: V) -> Option<K> {
        let now = self.clock.now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(&idx) = inner.index.get(&key) {
            if let Some((_, entry)) = inner.order.get_mut(idx) {
                entry.refresh(value, now, self.ttl);
            }
            inner.order.move_to_back(idx);
            return None;
        }

        let mut evicted = None;
        if inner.index.len() >= self.capacity.get() {
            if let Some((old_key, _)) = inner.order.pop_front() {
                inner.index.remove(&old_key);
                inner.stats.record_eviction();
                trace!("evicted least recently used entry");
                evicted = Some(old_key);
            }
        }

        let entry = CacheEntry::new(value, now, self.ttl);
        let idx = inner.order.push_back((key.clone(), entry));
        inner.index.insert(key, idx);
        evicted
    }

    // == Update If Present ==
    /// Refreshes `key` like [`put`](Self::put), but only if it holds a live
    /// entry. Never inserts, never evicts and leaves hit/miss counters alone.
    pub fn update_if_present(&self, key: &K, value: V) -> bool {
        let now = self.clock.now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let Some(&idx) = inner.index.get(key) else {
            return false;
        };

        match inner.order.get_mut(idx) {
            Some((_, entry)) if !entry.is_expired(now) => {
                entry.refresh(value, now, self.ttl);
                inner.order.move_to_back(idx);
                true
            }
            _ => {
                inner.order.remove(idx);
                inner.index.remove(key);
                inner.stats.record_expiration();
                false
            }
        }
    }

    // == Delete ==
    /// Removes `key` if present. Returns whether an entry was removed.
    pub fn delete(&self, key: &K) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.index.remove(key) {
            Some(idx) => {
                inner.order.remove(idx);
                true
            }
            None => false,
        }
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.index.len());
        stats
    }

    // == Length ==
    /// Returns the number of occupied slots, expired-but-untouched included.
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Keys ordered from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.lock()
            .order
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        // No operation can leave the state half-updated across a panic
        // boundary, so a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks that the key index and the recency list agree.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let inner = self.lock();
        inner.index.len() == inner.order.len()
            && inner.order.iter().count() == inner.order.len()
            && inner
                .index
                .iter()
                .all(|(key, &idx)| matches!(inner.order.get(idx), Some((k, _)) if k == key))
    }
}

impl<K, V> fmt::Debug for ExpiringLruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringLruCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
