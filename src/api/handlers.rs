//! API Handlers
//!
//! HTTP request handlers for the item and operational endpoints. Handlers
//! only translate between HTTP and [`ItemService`]; failures surface as
//! [`CatalogError`] and are rendered by its `IntoResponse` impl.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::catalog::ItemService;
use crate::error::{CatalogError, Result};
use crate::models::{
    DeleteTime, HealthResponse, ItemInfo, ItemRequest, ResponseData, StatsResponse, StoreInfo,
};

const SUCCESS_MSG: &str = "success";

/// JSON body extraction with the rejection kept for our own error envelope.
type ItemPayload = std::result::Result<Json<ItemRequest>, JsonRejection>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ItemService>,
}

impl AppState {
    pub fn new(service: ItemService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Parses the `item_id` path segment; anything but an integer is the
/// client's fault.
fn parse_item_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| CatalogError::InvalidRequest(format!("item_id {raw:?} is not an integer")))
}

fn parse_body(payload: ItemPayload) -> Result<ItemRequest> {
    payload
        .map(|Json(req)| req)
        .map_err(|rejection| CatalogError::InvalidRequest(rejection.body_text()))
}

/// Handler for POST /items
pub async fn create_item_handler(
    State(state): State<AppState>,
    payload: ItemPayload,
) -> Result<Json<ResponseData<ItemInfo>>> {
    let req = parse_body(payload)?;
    let item = state.service.create_item(req.into()).await?;

    Ok(Json(ResponseData::success(
        SUCCESS_MSG,
        ItemInfo {
            item_info: (&item).into(),
        },
    )))
}

/// Handler for GET /items/:item_id
pub async fn get_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<ResponseData<StoreInfo>>> {
    let item_id = parse_item_id(&item_id)?;
    let snapshot = state.service.get_item(item_id).await?;

    Ok(Json(ResponseData::success(
        SUCCESS_MSG,
        StoreInfo {
            store_info: snapshot,
        },
    )))
}

/// Handler for PUT /items/:item_id
pub async fn update_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    payload: ItemPayload,
) -> Result<Json<ResponseData<StoreInfo>>> {
    let item_id = parse_item_id(&item_id)?;
    let req = parse_body(payload)?;
    let snapshot = state.service.update_item(item_id, req.into()).await?;

    Ok(Json(ResponseData::success(
        SUCCESS_MSG,
        StoreInfo {
            store_info: snapshot,
        },
    )))
}

/// Handler for DELETE /items/:item_id
pub async fn delete_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<ResponseData<DeleteTime>>> {
    let item_id = parse_item_id(&item_id)?;
    let deleted_at = state.service.delete_item(item_id).await?;

    Ok(Json(ResponseData::success(SUCCESS_MSG, deleted_at.into())))
}

/// Handler for GET /stats
///
/// Reports the local cache of this instance only.
pub async fn stats_handler(State(state): State<AppState>) -> Json<ResponseData<StatsResponse>> {
    let stats = state.service.cache_stats();
    Json(ResponseData::success(SUCCESS_MSG, stats.into()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<ResponseData<HealthResponse>> {
    Json(ResponseData::success(SUCCESS_MSG, HealthResponse::healthy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ExpiringLruCache;
    use crate::catalog::{CacheFacade, MemoryItemRepository};
    use crate::lock::{DistributedLock, LockSettings};
    use crate::remote::MemoryKv;
    use std::num::NonZeroUsize;
    use std::time::Duration;

    fn test_state() -> AppState {
        let remote = Arc::new(MemoryKv::new());
        let local = Arc::new(ExpiringLruCache::new(
            NonZeroUsize::new(100).unwrap(),
            Duration::from_secs(300),
        ));
        AppState::new(ItemService::new(
            Arc::new(MemoryItemRepository::new()),
            CacheFacade::new(local, remote.clone(), "mi_", 3600),
            DistributedLock::new(remote),
            LockSettings {
                lease: Duration::from_secs(30),
                max_wait: Duration::from_millis(100),
            },
        ))
    }

    fn request(name: &str, price: f64) -> ItemPayload {
        Ok(Json(ItemRequest {
            name: name.to_string(),
            price,
        }))
    }

    #[test]
    fn test_parse_item_id() {
        assert_eq!(parse_item_id("42").unwrap(), 42);
        assert!(matches!(
            parse_item_id("abc"),
            Err(CatalogError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_create_and_get_handler() {
        let state = test_state();

        let created = create_item_handler(State(state.clone()), request("pen", 1.5))
            .await
            .unwrap();
        assert_eq!(created.code, 0);
        let item_id = created.data.as_ref().unwrap().item_info.item_id;

        let fetched = get_item_handler(State(state), Path(item_id.to_string()))
            .await
            .unwrap();
        assert_eq!(fetched.data.as_ref().unwrap().store_info.name, "pen");
    }

    #[tokio::test]
    async fn test_get_nonexistent_item() {
        let state = test_state();
        let result = get_item_handler(State(state), Path("99".to_string())).await;
        assert!(matches!(result, Err(CatalogError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_update_and_delete_handler() {
        let state = test_state();
        create_item_handler(State(state.clone()), request("pen", 1.5))
            .await
            .unwrap();

        let updated =
            update_item_handler(State(state.clone()), Path("1".into()), request("pen", 2.5))
                .await
                .unwrap();
        assert_eq!(updated.data.as_ref().unwrap().store_info.price, 2.5);

        let deleted = delete_item_handler(State(state.clone()), Path("1".into()))
            .await
            .unwrap();
        assert!(!deleted.data.as_ref().unwrap().delete_time.is_empty());

        let result = get_item_handler(State(state), Path("1".into())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_invalid_request() {
        let state = test_state();
        let result = create_item_handler(State(state), request("", 1.0)).await;
        assert!(matches!(result, Err(CatalogError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        let response = stats_handler(State(state)).await;
        let stats = response.data.as_ref().unwrap();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.capacity, 100);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.data.as_ref().unwrap().status, "healthy");
    }
}
