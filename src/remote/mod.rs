//! Remote Store Module
//!
//! The shared key-value tier used both as the second-level cache and as the
//! arbiter for distributed locks.
//!
//! # Implementations
//! - [`RedisKv`] - pooled Redis connections, shared between instances
//! - [`MemoryKv`] - in-process map with clock-driven TTLs, for a single
//!   instance and for tests

mod memory;
mod redis_kv;

use async_trait::async_trait;

use crate::error::StoreError;

pub use self::memory::MemoryKv;
pub use self::redis_kv::{connect, RedisKv};

// == Remote KV Trait ==
/// Opaque-bytes key-value store with whole-second TTLs.
#[async_trait]
pub trait RemoteKv: Send + Sync {
    /// Writes `value` under `key` expiring after `ttl_secs`.
    ///
    /// With `only_if_absent` the write is an atomic set-if-absent and
    /// returns `false` when the key already exists. Unconditional writes
    /// always return `true`.
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl_secs: u64,
        only_if_absent: bool,
    ) -> Result<bool, StoreError>;

    /// Reads `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Deletes `key`, returning the number of keys removed.
    async fn del(&self, key: &str) -> Result<u64, StoreError>;
}
