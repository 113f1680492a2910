//! Redis-backed key-value store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use super::{MemoryKv, RemoteKv};
use crate::config::RedisConfig;
use crate::error::StoreError;

/// [`RemoteKv`] over a deadpool connection pool.
///
/// Each call checks a connection out for exactly one command and returns it
/// to the pool when the call finishes.
#[derive(Clone)]
pub struct RedisKv {
    pool: Pool,
}

impl RedisKv {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a pool for `url` sized and timed by `config`.
    pub fn from_url(url: &str, config: &RedisConfig) -> Result<Self, StoreError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);

        let mut redis_config = deadpool_redis::Config::from_url(url);
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Pool(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Round-trips a PING to prove the server is reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteKv for RedisKv {
    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl_secs: u64,
        only_if_absent: bool,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;

        if only_if_absent {
            // SET .. NX replies nil when the key already exists
            let reply: Option<String> = redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl_secs)
                .arg("NX")
                .query_async(&mut conn)
                .await?;
            debug!(key = %key, acquired = reply.is_some(), "SET NX");
            return Ok(reply.is_some());
        }

        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.get::<_, Option<Vec<u8>>>(key).await?)
    }

    async fn del(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(conn.del::<_, u64>(key).await?)
    }
}

/// Creates the shared store described by `config`.
///
/// Without a Redis URL the service runs single-instance on a [`MemoryKv`];
/// locks then only exclude writers inside this process. With a URL the pool
/// must answer a PING before startup continues.
pub async fn connect(config: &RedisConfig) -> Result<Arc<dyn RemoteKv>, StoreError> {
    let Some(url) = config.url.as_deref() else {
        warn!("REDIS_URL not set, using in-process store (locks are local to this instance)");
        return Ok(Arc::new(MemoryKv::new()));
    };

    info!(pool_size = config.pool_size, "Connecting to Redis");
    let kv = RedisKv::from_url(url, config)?;
    kv.ping().await?;
    info!("Connected to Redis");

    Ok(Arc::new(kv))
}
