//! Catalog Domain
//!
//! Items, their system of record, the two-tier cache facade and the
//! service that ties them together under the distributed lock.

mod facade;
mod model;
mod postgres;
mod repository;
mod service;

pub use facade::CacheFacade;
pub use model::{Item, ItemSnapshot, NewItem, MAX_NAME_LENGTH};
pub use postgres::{connect_repository, PgItemRepository};
pub use repository::{ItemRepository, MemoryItemRepository};
pub use service::{id_lock_key, name_lock_key, ItemService};
