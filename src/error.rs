//! Error types for the catalog service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ResponseData;

// == Store Error ==
/// Failure talking to the remote key-value tier.
///
/// A miss is never an error; it is reported as `None` by the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No pooled connection could be obtained
    #[error("store connection unavailable: {0}")]
    Pool(String),

    /// The store rejected or failed a command
    #[error("store command failed: {0}")]
    Command(String),

    /// A cached payload could not be encoded or decoded
    #[error("cached payload is malformed: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<deadpool_redis::PoolError> for StoreError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Command(err.to_string())
    }
}

// == Config Error ==
/// Rejected configuration value.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must be at most {1}")]
    TooLarge(&'static str, u64),

    /// Exactly one of the shared store and the system of record is external
    #[error("REDIS_URL and DATABASE_URL must be set together")]
    UnpairedStores,
}

// == Catalog Error Enum ==
/// Error type surfaced by the item service and its HTTP handlers.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No item with this id exists
    #[error("item {0} not found")]
    NotFound(i64),

    /// Invalid request data
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The lock guarding the resource was not acquired within the wait budget
    #[error("resource {0} is busy, try again later")]
    LockTimeout(String),

    /// The shared store failed while it was required
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The system of record failed
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx_core::Error> for CatalogError {
    fn from(err: sqlx_core::Error) -> Self {
        CatalogError::Database(err.to_string())
    }
}

impl CatalogError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CatalogError::LockTimeout(_) => StatusCode::CONFLICT,
            CatalogError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            CatalogError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body: ResponseData = if status.is_client_error() {
            ResponseData::request_error(self.to_string())
        } else {
            ResponseData::server_error(self.to_string())
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the catalog service.
pub type Result<T> = std::result::Result<T, CatalogError>;
