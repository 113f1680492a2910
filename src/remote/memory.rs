//! In-process key-value store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::RemoteKv;
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;

/// [`RemoteKv`] kept in a local map.
///
/// Set-if-absent is atomic under the map mutex, so locks taken through it
/// are exclusive within this process. Expired keys are treated as absent and
/// dropped when touched. A TTL reaching past what `Instant` can represent
/// never expires.
#[derive(Debug)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
    clock: Arc<dyn Clock>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.lock()
            .values()
            .filter(|(_, expires_at)| !is_expired(*expires_at, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (Vec<u8>, Option<Instant>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the live entry for `key`, dropping it if it has expired.
    fn live<'a>(
        entries: &'a mut HashMap<String, (Vec<u8>, Option<Instant>)>,
        key: &str,
        now: Instant,
    ) -> Option<&'a Vec<u8>> {
        let expired = entries
            .get(key)
            .is_some_and(|(_, expires_at)| is_expired(*expires_at, now));
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(value, _)| value)
    }
}

fn is_expired(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_some_and(|at| now >= at)
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteKv for MemoryKv {
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl_secs: u64,
        only_if_absent: bool,
    ) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock();

        if only_if_absent && Self::live(&mut entries, key, now).is_some() {
            return Ok(false);
        }

        let expires_at = now.checked_add(Duration::from_secs(ttl_secs));
        entries.insert(key.to_string(), (value.to_vec(), expires_at));
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock();
        Ok(Self::live(&mut entries, key, now).cloned())
    }

    async fn del(&self, key: &str) -> Result<u64, StoreError> {
        let now = self.clock.now();
        let mut entries = self.lock();
        if Self::live(&mut entries, key, now).is_none() {
            return Ok(0);
        }
        entries.remove(key);
        Ok(1)
    }
}
