//! Cache Entry Module
//!
//! Defines the value-plus-deadline pair stored for every cached key.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value together with the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored snapshot
    pub value: V,
    /// Instant at which the entry becomes logically absent; `None` when
    /// `now + ttl` lies beyond what `Instant` can represent
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`, so a TTL that has
    /// fully elapsed is never served.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    // == Refresh ==
    /// Replaces the value and restarts the TTL from `now`.
    pub fn refresh(&mut self, value: V, now: Instant, ttl: Duration) {
        self.value = value;
        self.expires_at = now.checked_add(ttl);
    }
}
