//! System-of-record seam for catalog items.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::model::{Item, NewItem};
use crate::error::Result;

/// Authoritative item storage.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Stores a new item and returns it with its assigned id.
    async fn insert(&self, item: NewItem) -> Result<Item>;

    async fn find(&self, item_id: i64) -> Result<Option<Item>>;

    /// Replaces name and price; `None` if the item does not exist.
    async fn update(&self, item_id: i64, item: NewItem) -> Result<Option<Item>>;

    /// Returns whether an item was deleted.
    async fn delete(&self, item_id: i64) -> Result<bool>;
}

/// In-process repository with ids assigned from 1 upwards.
#[derive(Debug, Default)]
pub struct MemoryItemRepository {
    state: RwLock<RepositoryState>,
}

#[derive(Debug, Default)]
struct RepositoryState {
    items: BTreeMap<i64, Item>,
    last_id: i64,
}

impl MemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for MemoryItemRepository {
    async fn insert(&self, item: NewItem) -> Result<Item> {
        let mut state = self.state.write().await;
        state.last_id += 1;

        let now = Utc::now();
        let item = Item {
            item_id: state.last_id,
            name: item.name,
            price: item.price,
            created_at: now,
            updated_at: now,
        };
        state.items.insert(item.item_id, item.clone());
        Ok(item)
    }

    async fn find(&self, item_id: i64) -> Result<Option<Item>> {
        Ok(self.state.read().await.items.get(&item_id).cloned())
    }

    async fn update(&self, item_id: i64, item: NewItem) -> Result<Option<Item>> {
        let mut state = self.state.write().await;
        Ok(state.items.get_mut(&item_id).map(|stored| {
            stored.name = item.name;
            stored.price = item.price;
            stored.updated_at = Utc::now();
            stored.clone()
        }))
    }

    async fn delete(&self, item_id: i64) -> Result<bool> {
        Ok(self.state.write().await.items.remove(&item_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(name: &str, price: f64) -> NewItem {
        NewItem {
            name: name.to_string(),
            price,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = MemoryItemRepository::new();

        let first = repo.insert(new_item("a", 1.0)).await.unwrap();
        let second = repo.insert(new_item("b", 2.0)).await.unwrap();

        assert_eq!(first.item_id, 1);
        assert_eq!(second.item_id, 2);
        assert_eq!(first.created_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_find_update_delete() {
        let repo = MemoryItemRepository::new();
        let item = repo.insert(new_item("a", 1.0)).await.unwrap();

        let updated = repo
            .update(item.item_id, new_item("a2", 3.5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "a2");
        assert_eq!(updated.price, 3.5);
        assert_eq!(updated.created_at, item.created_at);

        let found = repo.find(item.item_id).await.unwrap().unwrap();
        assert_eq!(found, updated);

        assert!(repo.delete(item.item_id).await.unwrap());
        assert!(!repo.delete(item.item_id).await.unwrap());
        assert_eq!(repo.find(item.item_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let repo = MemoryItemRepository::new();
        assert_eq!(repo.update(99, new_item("x", 1.0)).await.unwrap(), None);
    }
}
