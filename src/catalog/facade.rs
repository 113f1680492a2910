//! Two-tier item cache: the in-process LRU in front of the shared store.

use std::sync::Arc;

use tracing::debug;

use super::model::ItemSnapshot;
use crate::cache::{CacheStats, ExpiringLruCache};
use crate::error::StoreError;
use crate::remote::RemoteKv;

/// Read-through / write-through access to cached item snapshots.
///
/// Lookup order is local cache, then shared store; a shared-store hit is
/// promoted into the local cache. Snapshots are JSON in the shared store,
/// under `{prefix}{item_id}`.
pub struct CacheFacade {
    local: Arc<ExpiringLruCache<i64, ItemSnapshot>>,
    remote: Arc<dyn RemoteKv>,
    prefix: String,
    remote_ttl_secs: u64,
}

impl CacheFacade {
    pub fn new(
        local: Arc<ExpiringLruCache<i64, ItemSnapshot>>,
        remote: Arc<dyn RemoteKv>,
        prefix: impl Into<String>,
        remote_ttl_secs: u64,
    ) -> Self {
        Self {
            local,
            remote,
            prefix: prefix.into(),
            remote_ttl_secs,
        }
    }

    /// Shared-store key for `item_id`.
    pub fn remote_key(&self, item_id: i64) -> String {
        format!("{}{}", self.prefix, item_id)
    }

    pub fn local_stats(&self) -> CacheStats {
        self.local.stats()
    }

    /// Finds a cached snapshot in either tier.
    pub async fn lookup_item(&self, item_id: i64) -> Result<Option<ItemSnapshot>, StoreError> {
        if let Some(snapshot) = self.local.get(&item_id) {
            debug!(item_id, tier = "local", "cache hit");
            return Ok(Some(snapshot));
        }

        let Some(payload) = self.remote.get(&self.remote_key(item_id)).await? else {
            debug!(item_id, "cache miss");
            return Ok(None);
        };

        let snapshot: ItemSnapshot = serde_json::from_slice(&payload)?;
        debug!(item_id, tier = "shared", "cache hit");
        self.local.put(item_id, snapshot.clone());
        Ok(Some(snapshot))
    }

    /// Writes `snapshot` to both tiers.
    pub async fn store_item(&self, item_id: i64, snapshot: &ItemSnapshot) -> Result<(), StoreError> {
        self.local.put(item_id, snapshot.clone());

        let payload = serde_json::to_vec(snapshot)?;
        self.remote
            .set(&self.remote_key(item_id), &payload, self.remote_ttl_secs, false)
            .await?;
        Ok(())
    }

    /// Replaces `snapshot` in whichever tiers already cache the item.
    ///
    /// Items nobody has read stay uncached.
    pub async fn refresh_item(
        &self,
        item_id: i64,
        snapshot: &ItemSnapshot,
    ) -> Result<(), StoreError> {
        self.local.update_if_present(&item_id, snapshot.clone());

        let key = self.remote_key(item_id);
        if self.remote.get(&key).await?.is_some() {
            let payload = serde_json::to_vec(snapshot)?;
            self.remote
                .set(&key, &payload, self.remote_ttl_secs, false)
                .await?;
        }
        Ok(())
    }

    /// Drops the item from both tiers.
    pub async fn invalidate_item(&self, item_id: i64) -> Result<(), StoreError> {
        self.local.delete(&item_id);
        self.remote.del(&self.remote_key(item_id)).await?;
        debug!(item_id, "cache invalidated");
        Ok(())
    }
}
