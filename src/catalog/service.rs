//! Item Service
//!
//! Orchestrates the system of record, both cache tiers and the distributed
//! lock for every catalog operation.
//!
//! # Write path
//! 1. Acquire the lock for the resource (timeout → `LockTimeout`)
//! 2. Perform the authoritative write
//! 3. Refresh or invalidate the cached copies
//! 4. Release the lock, whatever the outcome of 2 and 3
//!
//! # Read path
//! Local cache, shared store, then system of record; a record hit populates
//! both tiers if the item's lock is free. Cache and lock failures on this
//! path are logged and never fail the read.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::facade::CacheFacade;
use super::model::{Item, ItemSnapshot, NewItem};
use super::repository::ItemRepository;
use crate::cache::CacheStats;
use crate::error::{CatalogError, Result};
use crate::lock::{DistributedLock, LockSettings};

/// Lock guarding creation of items with a given name.
pub fn name_lock_key(name: &str) -> String {
    format!("item_lock_name_{name}")
}

/// Lock guarding changes to one existing item.
pub fn id_lock_key(item_id: i64) -> String {
    format!("item_lock_id_{item_id}")
}

pub struct ItemService {
    repository: Arc<dyn ItemRepository>,
    cache: CacheFacade,
    lock: DistributedLock,
    settings: LockSettings,
}

impl ItemService {
    pub fn new(
        repository: Arc<dyn ItemRepository>,
        cache: CacheFacade,
        lock: DistributedLock,
        settings: LockSettings,
    ) -> Self {
        Self {
            repository,
            cache,
            lock,
            settings,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.local_stats()
    }

    // == Create ==
    /// Inserts a new item. Fresh items are not cached until first read.
    pub async fn create_item(&self, item: NewItem) -> Result<Item> {
        item.validate()?;
        let lock_name = name_lock_key(&item.name);

        let created = self
            .with_lock(&lock_name, self.repository.insert(item))
            .await?;
        info!(item_id = created.item_id, name = %created.name, "item created");
        Ok(created)
    }

    // == Read ==
    pub async fn get_item(&self, item_id: i64) -> Result<ItemSnapshot> {
        match self.cache.lookup_item(item_id).await {
            Ok(Some(snapshot)) => return Ok(snapshot),
            Ok(None) => {}
            Err(e) => warn!(item_id, error = %e, "cache lookup failed, reading system of record"),
        }

        // Filling the cache needs the item's lock, so an update that commits
        // after our read cannot be overwritten by the older snapshot. A busy
        // lock means a writer is active; the read then skips the fill.
        let lock_name = id_lock_key(item_id);
        let token = DistributedLock::new_token();
        let locked = match self
            .lock
            .acquire(&lock_name, &token, self.settings.lease, Duration::ZERO)
            .await
        {
            Ok(locked) => locked,
            Err(e) => {
                warn!(item_id, error = %e, "could not lock item for cache fill");
                false
            }
        };

        let result = self.load_item(item_id, locked).await;
        if locked {
            self.lock.release_with_retry(&lock_name, &token).await;
        }
        result
    }

    async fn load_item(&self, item_id: i64, fill_cache: bool) -> Result<ItemSnapshot> {
        let item = self
            .repository
            .find(item_id)
            .await?
            .ok_or(CatalogError::NotFound(item_id))?;

        let snapshot = ItemSnapshot::from(&item);
        if !fill_cache {
            debug!(item_id, "item is being written, not caching");
        } else if let Err(e) = self.cache.store_item(item_id, &snapshot).await {
            warn!(item_id, error = %e, "failed to populate cache");
        }
        Ok(snapshot)
    }

    // == Update ==
    pub async fn update_item(&self, item_id: i64, item: NewItem) -> Result<ItemSnapshot> {
        item.validate()?;
        let lock_name = id_lock_key(item_id);

        let snapshot = self
            .with_lock(&lock_name, async {
                let updated = self
                    .repository
                    .update(item_id, item)
                    .await?
                    .ok_or(CatalogError::NotFound(item_id))?;

                let snapshot = ItemSnapshot::from(&updated);
                if let Err(e) = self.cache.refresh_item(item_id, &snapshot).await {
                    warn!(item_id, error = %e, "failed to refresh cached item");
                }
                Ok(snapshot)
            })
            .await?;

        info!(item_id, name = %snapshot.name, "item updated");
        Ok(snapshot)
    }

    // == Delete ==
    /// Deletes an item and returns when it happened.
    pub async fn delete_item(&self, item_id: i64) -> Result<DateTime<Utc>> {
        let lock_name = id_lock_key(item_id);

        self.with_lock(&lock_name, async {
            if !self.repository.delete(item_id).await? {
                return Err(CatalogError::NotFound(item_id));
            }
            if let Err(e) = self.cache.invalidate_item(item_id).await {
                warn!(item_id, error = %e, "failed to invalidate cached item");
            }
            Ok(())
        })
        .await?;

        let deleted_at = Utc::now();
        info!(item_id, %deleted_at, "item deleted");
        Ok(deleted_at)
    }

    /// Runs `work` while holding `lock_name`.
    async fn with_lock<T>(
        &self,
        lock_name: &str,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let token = DistributedLock::new_token();
        let acquired = self
            .lock
            .acquire(
                lock_name,
                &token,
                self.settings.lease,
                self.settings.max_wait,
            )
            .await?;

        if !acquired {
            warn!(lock = %lock_name, "timed out waiting for lock");
            return Err(CatalogError::LockTimeout(lock_name.to_string()));
        }

        let result = work.await;
        self.lock.release_with_retry(lock_name, &token).await;
        result
    }
}
