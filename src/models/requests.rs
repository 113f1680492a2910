//! Request DTOs for the catalog API

use serde::Deserialize;

use crate::catalog::NewItem;

/// Request body for creating (POST /items) or updating (PUT /items/:item_id)
/// an item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub price: f64,
}

impl From<ItemRequest> for NewItem {
    fn from(req: ItemRequest) -> Self {
        Self {
            name: req.name,
            price: req.price,
        }
    }
}
