//! Request and Response models for the catalog API
//!
//! Every response body is wrapped in [`ResponseData`]: a numeric `code`, a
//! human-readable `msg` and an optional `data` payload.

pub mod requests;
pub mod responses;

use serde::{Deserialize, Serialize};

pub use requests::ItemRequest;
pub use responses::{DeleteTime, HealthResponse, ItemInfo, StatsResponse, StoreInfo};

/// Envelope code for a successful call
pub const CODE_SUCCESS: i32 = 0;
/// Envelope code for a rejected request
pub const CODE_REQUEST_ERROR: i32 = 1;
/// Envelope code for a failure on the server side
pub const CODE_SERVER_ERROR: i32 = 2;

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData<T = ()> {
    pub code: i32,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ResponseData<T> {
    pub fn success(msg: impl Into<String>, data: T) -> Self {
        Self {
            code: CODE_SUCCESS,
            msg: msg.into(),
            data: Some(data),
        }
    }
}

impl ResponseData {
    /// Envelope for a request the client has to fix before retrying.
    pub fn request_error(msg: impl Into<String>) -> Self {
        Self {
            code: CODE_REQUEST_ERROR,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn server_error(msg: impl Into<String>) -> Self {
        Self {
            code: CODE_SERVER_ERROR,
            msg: msg.into(),
            data: None,
        }
    }
}
