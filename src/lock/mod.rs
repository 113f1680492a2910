//! Distributed Lock Module
//!
//! Lease-based mutual exclusion across service instances, arbitrated by the
//! shared key-value store.
//!
//! A lock is the key `name` holding the holder's token with a store-side
//! TTL. Acquisition is an atomic set-if-absent retried until a deadline;
//! release deletes the key only while it still holds the caller's token, so
//! a holder whose lease already lapsed can never free a successor's lock.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::LockConfig;
use crate::error::StoreError;
use crate::remote::RemoteKv;

// == Constants ==
/// Pause between two set-if-absent attempts while the lock is held
pub const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Release attempts made by [`DistributedLock::release_with_retry`]
pub const RELEASE_ATTEMPTS: u32 = 3;

// == Lock Settings ==
/// Lease and wait budget applied to every lock a service takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSettings {
    pub lease: Duration,
    pub max_wait: Duration,
}

impl From<&LockConfig> for LockSettings {
    fn from(config: &LockConfig) -> Self {
        Self {
            lease: config.lease(),
            max_wait: config.max_wait(),
        }
    }
}

// == Distributed Lock ==
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn RemoteKv>,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn RemoteKv>) -> Self {
        Self { store }
    }

    /// Generates a fresh holder token.
    pub fn new_token() -> String {
        Uuid::new_v4().to_string()
    }

    // == Acquire ==
    /// Tries to take `name` for `token` with the given lease.
    ///
    /// Returns `Ok(false)` once `max_wait` has elapsed without success; that
    /// is an ordinary outcome, not an error. At least one attempt is made
    /// even with a zero wait. Store failures end the loop immediately.
    pub async fn acquire(
        &self,
        name: &str,
        token: &str,
        lease: Duration,
        max_wait: Duration,
    ) -> Result<bool, StoreError> {
        let lease_secs = lease_seconds(lease);
        // A wait too long to represent as an instant never runs out
        let deadline = Instant::now().checked_add(max_wait);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if self
                .store
                .set(name, token.as_bytes(), lease_secs, true)
                .await?
            {
                debug!(lock = %name, attempts, "lock acquired");
                return Ok(true);
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(lock = %name, attempts, "lock wait budget exhausted");
                        return Ok(false);
                    }
                    RETRY_BACKOFF.min(deadline - now)
                }
                None => RETRY_BACKOFF,
            };
            sleep(pause).await;
        }
    }

    // == Release ==
    /// Frees `name` if, and only if, it is still held by `token`.
    ///
    /// An absent key (lease already lapsed) and a key held by someone else
    /// both count as success without side effects.
    pub async fn release(&self, name: &str, token: &str) -> Result<(), StoreError> {
        match self.store.get(name).await? {
            None => {
                debug!(lock = %name, "lock already free");
            }
            Some(current) if current != token.as_bytes() => {
                debug!(lock = %name, "lock held by another holder, leaving it");
            }
            Some(_) => {
                self.store.del(name).await?;
                debug!(lock = %name, "lock released");
            }
        }
        Ok(())
    }

    /// [`release`](Self::release) retried up to [`RELEASE_ATTEMPTS`] times.
    ///
    /// Failures are logged and swallowed; the lease bounds how long an
    /// unreleased lock can linger.
    pub async fn release_with_retry(&self, name: &str, token: &str) {
        for attempt in 1..=RELEASE_ATTEMPTS {
            match self.release(name, token).await {
                Ok(()) => return,
                Err(e) => warn!(lock = %name, attempt, error = %e, "lock release failed"),
            }
        }
        warn!(lock = %name, "giving up on lock release, lease expiry will free it");
    }
}

/// Store TTLs are whole seconds: round up, never below one.
fn lease_seconds(lease: Duration) -> u64 {
    let secs = lease
        .as_secs()
        .saturating_add(u64::from(lease.subsec_nanos() > 0));
    secs.max(1)
}
