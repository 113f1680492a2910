//! Catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Longest accepted item name, in characters
pub const MAX_NAME_LENGTH: usize = 255;

/// An item as held by the system of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: i64,
    pub name: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating or updating an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
}

impl NewItem {
    /// Checks the name and price before anything is locked or written.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::InvalidRequest("name cannot be empty".into()));
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(CatalogError::InvalidRequest(format!(
                "name exceeds maximum length of {MAX_NAME_LENGTH} characters"
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CatalogError::InvalidRequest(
                "price must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// The cached form of an item, stored in both cache tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: i64,
    pub name: String,
    pub price: f64,
}

impl From<&Item> for ItemSnapshot {
    fn from(item: &Item) -> Self {
        Self {
            item_id: item.item_id,
            name: item.name.clone(),
            price: item.price,
        }
    }
}
