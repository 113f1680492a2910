//! Response payloads for the catalog API
//!
//! These are carried in the `data` field of [`super::ResponseData`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::catalog::ItemSnapshot;

/// Layout of `delete_time` in delete responses
pub const DELETE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Payload of POST /items.
#[derive(Debug, Clone, Serialize)]
pub struct ItemInfo {
    pub item_info: ItemSnapshot,
}

/// Payload of GET and PUT /items/:item_id.
#[derive(Debug, Clone, Serialize)]
pub struct StoreInfo {
    pub store_info: ItemSnapshot,
}

/// Payload of DELETE /items/:item_id.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteTime {
    /// UTC time of the deletion
    pub delete_time: String,
}

impl From<DateTime<Utc>> for DeleteTime {
    fn from(at: DateTime<Utc>) -> Self {
        Self {
            delete_time: at.format(DELETE_TIME_FORMAT).to_string(),
        }
    }
}

/// Payload of GET /stats: the local cache counters of this instance.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            capacity: stats.capacity,
        }
    }
}

/// Payload of GET /health.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
