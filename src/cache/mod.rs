//! Cache Module
//!
//! In-process expiring LRU cache: fixed capacity, uniform TTL, lazy expiry.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruList;
pub use stats::CacheStats;
pub use store::ExpiringLruCache;
