//! Configuration Module
//!
//! Handles loading and validating server configuration from environment variables.

use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Longest accepted TTL, lease or wait, in seconds (ten years)
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Local (per-instance) cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCacheConfig {
    /// Maximum number of items held in process
    pub capacity: usize,
    /// Lifetime of a local entry after its last write, in seconds
    pub ttl_secs: u64,
}

/// Shared store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Connection URL; `None` runs on the in-process store
    pub url: Option<String>,
    /// Namespace prepended to every cached item key
    pub prefix: String,
    /// Lifetime of a shared cache entry, in seconds
    pub expire_secs: u64,
    /// Maximum pooled connections
    pub pool_size: usize,
    /// Wait/create/recycle timeout for pooled connections, in milliseconds
    pub timeout_ms: u64,
}

/// System-of-record settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; `None` keeps items in process
    pub url: Option<String>,
    /// Maximum pooled connections
    pub pool_size: u32,
    /// Connection acquire timeout, in milliseconds
    pub timeout_ms: u64,
}

/// Distributed lock settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// Lease granted to a lock holder, in seconds
    pub lease_secs: u64,
    /// Longest time a writer waits for a lock, in seconds
    pub max_wait_secs: u64,
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    pub cache: LocalCacheConfig,
    pub redis: RedisConfig,
    pub database: DatabaseConfig,
    pub lock: LockConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `LOCAL_CACHE_CAPACITY` - Local cache entries (default: 1000)
    /// - `LOCAL_CACHE_TTL_SECS` - Local entry lifetime (default: 60)
    /// - `REDIS_URL` - Shared store URL (default: unset, in-process store)
    /// - `REDIS_PREFIX` - Item key namespace (default: "mi_")
    /// - `REDIS_EXPIRE_SECS` - Shared entry lifetime (default: 3600)
    /// - `REDIS_POOL_SIZE` - Pooled connections (default: 16)
    /// - `REDIS_TIMEOUT_MS` - Pool timeouts (default: 5000)
    /// - `DATABASE_URL` - PostgreSQL URL (default: unset, in-process records)
    /// - `DATABASE_POOL_SIZE` - Pooled connections (default: 10)
    /// - `DATABASE_TIMEOUT_MS` - Acquire timeout (default: 5000)
    /// - `LOCK_LEASE_SECS` - Lock lease (default: 30)
    /// - `LOCK_MAX_WAIT_SECS` - Lock acquisition budget (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache: LocalCacheConfig {
                capacity: env_or("LOCAL_CACHE_CAPACITY", defaults.cache.capacity),
                ttl_secs: env_or("LOCAL_CACHE_TTL_SECS", defaults.cache.ttl_secs),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
                prefix: env::var("REDIS_PREFIX").unwrap_or(defaults.redis.prefix),
                expire_secs: env_or("REDIS_EXPIRE_SECS", defaults.redis.expire_secs),
                pool_size: env_or("REDIS_POOL_SIZE", defaults.redis.pool_size),
                timeout_ms: env_or("REDIS_TIMEOUT_MS", defaults.redis.timeout_ms),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                pool_size: env_or("DATABASE_POOL_SIZE", defaults.database.pool_size),
                timeout_ms: env_or("DATABASE_TIMEOUT_MS", defaults.database.timeout_ms),
            },
            lock: LockConfig {
                lease_secs: env_or("LOCK_LEASE_SECS", defaults.lock.lease_secs),
                max_wait_secs: env_or("LOCK_MAX_WAIT_SECS", defaults.lock.max_wait_secs),
            },
        }
    }

    /// Rejects values the cache, store or lock cannot operate with.
    ///
    /// Durations are bounded so that `now + duration` stays representable.
    /// The shared store and the system of record are either both external
    /// or both in process: a shared cache over per-process records would
    /// serve one instance's items under another instance's ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::Zero("LOCAL_CACHE_CAPACITY"));
        }
        if self.redis.pool_size == 0 {
            return Err(ConfigError::Zero("REDIS_POOL_SIZE"));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::Zero("DATABASE_POOL_SIZE"));
        }

        check_secs("LOCAL_CACHE_TTL_SECS", self.cache.ttl_secs, false)?;
        check_secs("REDIS_EXPIRE_SECS", self.redis.expire_secs, false)?;
        check_secs("LOCK_LEASE_SECS", self.lock.lease_secs, false)?;
        check_secs("LOCK_MAX_WAIT_SECS", self.lock.max_wait_secs, true)?;
        check_millis("REDIS_TIMEOUT_MS", self.redis.timeout_ms)?;
        check_millis("DATABASE_TIMEOUT_MS", self.database.timeout_ms)?;

        if self.redis.url.is_some() != self.database.url.is_some() {
            return Err(ConfigError::UnpairedStores);
        }
        Ok(())
    }
}

fn check_secs(name: &'static str, secs: u64, zero_allowed: bool) -> Result<(), ConfigError> {
    if secs == 0 && !zero_allowed {
        return Err(ConfigError::Zero(name));
    }
    if secs > MAX_DURATION_SECS {
        return Err(ConfigError::TooLarge(name, MAX_DURATION_SECS));
    }
    Ok(())
}

fn check_millis(name: &'static str, millis: u64) -> Result<(), ConfigError> {
    let max = MAX_DURATION_SECS * 1000;
    if millis > max {
        return Err(ConfigError::TooLarge(name, max));
    }
    Ok(())
}

impl LocalCacheConfig {
    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.capacity).ok_or(ConfigError::Zero("LOCAL_CACHE_CAPACITY"))
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl LockConfig {
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            prefix: "mi_".to_string(),
            expire_secs: 3600,
            pool_size: 16,
            timeout_ms: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 10,
            timeout_ms: 5000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache: LocalCacheConfig {
                capacity: 1000,
                ttl_secs: 60,
            },
            redis: RedisConfig::default(),
            database: DatabaseConfig::default(),
            lock: LockConfig {
                lease_secs: 30,
                max_wait_secs: 5,
            },
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
