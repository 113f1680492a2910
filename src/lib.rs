//! Catalog Cache - an item catalog service behind two cache tiers
//!
//! Reads go through an expiring in-process LRU cache and a shared Redis
//! tier before reaching the system of record. Writes are serialized across
//! instances with lease-based distributed locks held in the shared tier.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod lock;
pub mod models;
pub mod remote;

pub use api::AppState;
pub use config::Config;
