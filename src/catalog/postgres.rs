//! PostgreSQL system of record, shared by every instance.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx_core::pool::PoolOptions;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::{PgPool, Postgres};
use tracing::{debug, info, warn};

use super::model::{Item, NewItem};
use super::repository::{ItemRepository, MemoryItemRepository};
use crate::config::DatabaseConfig;
use crate::error::Result;

const CREATE_ITEMS_TABLE: &str = "CREATE TABLE IF NOT EXISTS items (
    item_id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    price DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const ITEM_COLUMNS: &str = "item_id, name, price, created_at, updated_at";

/// Row layout matching [`ITEM_COLUMNS`].
type ItemRow = (i64, String, f64, DateTime<Utc>, DateTime<Utc>);

fn item_from_row((item_id, name, price, created_at, updated_at): ItemRow) -> Item {
    Item {
        item_id,
        name,
        price,
        created_at,
        updated_at,
    }
}

/// [`ItemRepository`] over a PostgreSQL `items` table. Ids come from the
/// table's sequence, so they are unique across instances.
#[derive(Debug, Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `url` and makes sure the `items` table exists.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self> {
        info!(pool_size = config.pool_size, "Connecting to PostgreSQL");
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_millis(config.timeout_ms))
            .connect(url)
            .await?;

        let repository = Self::new(pool);
        repository.ensure_schema().await?;
        info!("Connected to PostgreSQL");
        Ok(repository)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        query(CREATE_ITEMS_TABLE).execute(&self.pool).await?;
        debug!("items table ready");
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn insert(&self, item: NewItem) -> Result<Item> {
        let sql =
            format!("INSERT INTO items (name, price) VALUES ($1, $2) RETURNING {ITEM_COLUMNS}");
        let row: ItemRow = query_as(&sql)
            .bind(item.name)
            .bind(item.price)
            .fetch_one(&self.pool)
            .await?;
        Ok(item_from_row(row))
    }

    async fn find(&self, item_id: i64) -> Result<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = $1");
        let row: Option<ItemRow> = query_as(&sql)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(item_from_row))
    }

    async fn update(&self, item_id: i64, item: NewItem) -> Result<Option<Item>> {
        let sql = format!(
            "UPDATE items SET name = $2, price = $3, updated_at = now() \
             WHERE item_id = $1 RETURNING {ITEM_COLUMNS}"
        );
        let row: Option<ItemRow> = query_as(&sql)
            .bind(item_id)
            .bind(item.name)
            .bind(item.price)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(item_from_row))
    }

    async fn delete(&self, item_id: i64) -> Result<bool> {
        let result = query("DELETE FROM items WHERE item_id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Creates the system of record described by `config`.
///
/// Without a database URL items live in this process only.
pub async fn connect_repository(config: &DatabaseConfig) -> Result<Arc<dyn ItemRepository>> {
    let Some(url) = config.url.as_deref() else {
        warn!("DATABASE_URL not set, keeping items in process");
        return Ok(Arc::new(MemoryItemRepository::new()));
    };

    Ok(Arc::new(PgItemRepository::connect(url, config).await?))
}
