//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint, with the
//! in-process store standing in for Redis.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use catalog_cache::{
    api::create_router,
    cache::ExpiringLruCache,
    catalog::{id_lock_key, CacheFacade, ItemRepository, ItemService, MemoryItemRepository},
    lock::{DistributedLock, LockSettings},
    remote::{MemoryKv, RemoteKv},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

/// One service instance over a shared store and repository, as two
/// processes configured with the same Redis and PostgreSQL see them.
fn create_instance(remote: Arc<MemoryKv>, repository: Arc<dyn ItemRepository>) -> Router {
    let local = Arc::new(ExpiringLruCache::new(
        NonZeroUsize::new(100).unwrap(),
        Duration::from_secs(300),
    ));
    let service = ItemService::new(
        repository,
        CacheFacade::new(local, remote.clone(), "mi_", 3600),
        DistributedLock::new(remote),
        LockSettings {
            lease: Duration::from_secs(30),
            max_wait: Duration::from_millis(100),
        },
    );
    create_router(AppState::new(service))
}

fn create_test_app() -> (Router, Arc<MemoryKv>) {
    let remote = Arc::new(MemoryKv::new());
    let app = create_instance(remote.clone(), Arc::new(MemoryItemRepository::new()));
    (app, remote)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == Create Endpoint Tests ==

#[tokio::test]
async fn test_create_endpoint_success() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "POST", "/items", Some(r#"{"name":"pen","price":1.5}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["code"], 0);
    assert_eq!(json["data"]["item_info"]["item_id"], 1);
    assert_eq!(json["data"]["item_info"]["name"], "pen");
}

#[tokio::test]
async fn test_create_endpoint_rejects_invalid_item() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "POST", "/items", Some(r#"{"name":"","price":1.5}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 1);
    assert!(json["data"].is_null());

    let (status, json) = send(&app, "POST", "/items", Some(r#"{"name":"pen","price":-1}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 1);
}

#[tokio::test]
async fn test_create_endpoint_malformed_json() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "POST", "/items", Some("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 1);
}

// == Get Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_reads_through_cache() {
    let (app, remote) = create_test_app();
    send(&app, "POST", "/items", Some(r#"{"name":"lamp","price":20}"#)).await;

    let (status, json) = send(&app, "GET", "/items/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["store_info"]["name"], "lamp");
    assert_eq!(json["data"]["store_info"]["price"], 20.0);

    // The first read populated the shared tier
    assert!(remote.get("mi_1").await.unwrap().is_some());

    // The second read is a local hit
    send(&app, "GET", "/items/1", None).await;
    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["data"]["hits"], 1);
    assert_eq!(stats["data"]["total_entries"], 1);
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/items/404", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], 1);
    assert!(json["msg"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_get_endpoint_invalid_id() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/items/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 1);
}

// == Update Endpoint Tests ==

#[tokio::test]
async fn test_update_endpoint_refreshes_cached_item() {
    let (app, _) = create_test_app();
    send(&app, "POST", "/items", Some(r#"{"name":"pen","price":1.5}"#)).await;
    send(&app, "GET", "/items/1", None).await;

    let (status, json) = send(&app, "PUT", "/items/1", Some(r#"{"name":"pen","price":3.0}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["store_info"]["price"], 3.0);

    let (_, json) = send(&app, "GET", "/items/1", None).await;
    assert_eq!(json["data"]["store_info"]["price"], 3.0);
}

#[tokio::test]
async fn test_update_endpoint_missing_item() {
    let (app, _) = create_test_app();

    let (status, _) = send(&app, "PUT", "/items/9", Some(r#"{"name":"pen","price":1.0}"#)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_endpoint_busy_lock_is_conflict() {
    let (app, remote) = create_test_app();
    send(&app, "POST", "/items", Some(r#"{"name":"pen","price":1.5}"#)).await;

    // Another instance holds the item's lock
    remote.set(&id_lock_key(1), b"other", 30, true).await.unwrap();

    let (status, json) = send(&app, "PUT", "/items/1", Some(r#"{"name":"pen","price":9.0}"#)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], 1);

    let (_, json) = send(&app, "GET", "/items/1", None).await;
    assert_eq!(json["data"]["store_info"]["price"], 1.5);
}

// == Delete Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let (app, remote) = create_test_app();
    send(&app, "POST", "/items", Some(r#"{"name":"pen","price":1.5}"#)).await;
    send(&app, "GET", "/items/1", None).await;

    let (status, json) = send(&app, "DELETE", "/items/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["delete_time"].as_str().unwrap().len(), 19);
    assert_eq!(remote.get("mi_1").await.unwrap(), None);

    let (status, _) = send(&app, "GET", "/items/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/items/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Multi-Instance Tests ==

#[tokio::test]
async fn test_instances_share_the_remote_tier() {
    let remote = Arc::new(MemoryKv::new());
    let repository: Arc<dyn ItemRepository> = Arc::new(MemoryItemRepository::new());
    let first = create_instance(remote.clone(), repository.clone());
    let second = create_instance(remote.clone(), repository);

    send(&first, "POST", "/items", Some(r#"{"name":"cup","price":4.0}"#)).await;
    send(&first, "GET", "/items/1", None).await;
    send(&first, "PUT", "/items/1", Some(r#"{"name":"cup","price":5.0}"#)).await;

    // The second instance has nothing local and reads the refreshed shared copy
    let (status, json) = send(&second, "GET", "/items/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["store_info"]["price"], 5.0);

    let (_, stats) = send(&second, "GET", "/stats", None).await;
    assert_eq!(stats["data"]["misses"], 1);
    assert_eq!(stats["data"]["total_entries"], 1);
}

// == Operational Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_initial() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["hits"], 0);
    assert_eq!(json["data"]["misses"], 0);
    assert_eq!(json["data"]["capacity"], 100);
    assert_eq!(json["data"]["hit_rate"], 0.0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "healthy");
    assert!(json["data"]["timestamp"].is_string());
}
