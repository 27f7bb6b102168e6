use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use delivery_orders::api::rest::router;
use delivery_orders::error::AppError;
use delivery_orders::geo::{non_zero_distance, DistanceResolver, ResolverError};
use delivery_orders::models::coordinate::GeoPoint;
use delivery_orders::models::order::{Order, OrderStatus};
use delivery_orders::state::AppState;
use delivery_orders::store::{InMemoryOrderStore, OrderStore};
use serde_json::{json, Value};
use tower::ServiceExt;

struct FixedResolver(i64);

#[async_trait]
impl DistanceResolver for FixedResolver {
    async fn resolve(&self, _: &GeoPoint, _: &GeoPoint) -> Result<i64, ResolverError> {
        non_zero_distance(self.0)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct FailingResolver;

#[async_trait]
impl DistanceResolver for FailingResolver {
    async fn resolve(&self, _: &GeoPoint, _: &GeoPoint) -> Result<i64, ResolverError> {
        Err(ResolverError::Api {
            status: "OVER_QUERY_LIMIT".to_string(),
            message: "quota exceeded".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

struct UnreachableStore;

#[async_trait]
impl OrderStore for UnreachableStore {
    async fn insert(&self, _: i64, _: OrderStatus) -> Result<Order, AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn conditional_take(&self, _: i64, _: OrderStatus) -> Result<(), AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn list(&self, _: u64, _: u64) -> Result<Vec<Order>, AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    fn backend(&self) -> &'static str {
        "mysql"
    }
}

fn unreachable_store_app() -> axum::Router {
    let state = AppState::new(Arc::new(UnreachableStore), Arc::new(FixedResolver(164)));
    router(Arc::new(state))
}

fn setup_with(meters: i64) -> (axum::Router, Arc<InMemoryOrderStore>) {
    let store = Arc::new(InMemoryOrderStore::new());
    let state = AppState::new(store.clone(), Arc::new(FixedResolver(meters)));
    (router(Arc::new(state)), store)
}

fn setup() -> (axum::Router, Arc<InMemoryOrderStore>) {
    setup_with(164)
}

async fn add_orders(store: &InMemoryOrderStore, count: usize) {
    for _ in 0..count {
        store.insert(55, OrderStatus::Unassigned).await.unwrap();
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn raw_request(method: &str, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn hong_kong_route() -> Value {
    json!({
        "origin": ["22.288017", "114.140835"],
        "destination": ["22.288039", "114.142345"]
    })
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _store) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["resolver"], "fixed");
}

#[tokio::test]
async fn health_returns_503_when_store_is_down() {
    let response = unreachable_store_app()
        .oneshot(get_request("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("mysql store"));
    assert!(!message.contains("pool timed out"));
}

#[tokio::test]
async fn store_failure_returns_generic_500() {
    let response = unreachable_store_app()
        .oneshot(json_request("POST", "/orders", hong_kong_route()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "internal store error" })
    );
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _store) = setup();
    let response = app
        .clone()
        .oneshot(json_request("POST", "/orders", hong_kong_route()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("orders_placed_total 1"));
    assert!(body.contains("distance_resolution_seconds"));
}

#[tokio::test]
async fn list_on_empty_store_returns_empty_array() {
    let (app, _store) = setup();
    let response = app
        .oneshot(get_request("/orders?page=50&limit=10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "[]");
}

#[tokio::test]
async fn place_order_returns_unassigned_order() {
    let (app, _store) = setup();
    let response = app
        .oneshot(json_request("POST", "/orders", hong_kong_route()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body, json!({ "id": 1, "distance": 164, "status": "UNASSIGNED" }));
}

#[tokio::test]
async fn place_order_with_wrong_arity_returns_400() {
    let (app, store) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({
                "origin": ["22.288017"],
                "destination": ["22.288039", "114.142345"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("origin"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn place_order_with_non_numeric_coordinate_returns_400() {
    let (app, _store) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({
                "origin": ["22.288017", "114.140835"],
                "destination": ["twenty-two", "114.142345"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn place_order_with_malformed_json_returns_400() {
    let (app, _store) = setup();

    let response = app
        .clone()
        .oneshot(raw_request("POST", "/orders", "{\"origin\": [22.28, 114.14]"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Numbers instead of strings do not match the payload shape.
    let response = app
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({ "origin": [22.28, 114.14], "destination": [22.29, 114.15] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zero_distance_returns_500() {
    let (app, store) = setup_with(0);
    let response = app
        .oneshot(json_request("POST", "/orders", hong_kong_route()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("coordinates invalid"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn resolver_failure_returns_500() {
    let store = Arc::new(InMemoryOrderStore::new());
    let app = router(Arc::new(AppState::new(store.clone(), Arc::new(FailingResolver))));

    let response = app
        .oneshot(json_request("POST", "/orders", hong_kong_route()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("OVER_QUERY_LIMIT"));
}

#[tokio::test]
async fn list_orders_pages_from_position() {
    let (app, store) = setup();
    add_orders(&store, 6).await;

    let response = app
        .oneshot(get_request("/orders?page=2&limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], 2);
    assert_eq!(orders[1]["id"], 3);
    assert_eq!(orders[0]["distance"], 55);
}

#[tokio::test]
async fn list_orders_rejects_bad_pagination() {
    let (app, _store) = setup();

    for uri in [
        "/orders?page=0&limit=10",
        "/orders?page=-1&limit=10",
        "/orders?page=one&limit=10",
        "/orders?page=1&limit=ten",
        "/orders?page=1",
        "/orders?limit=1",
        "/orders",
        "/orders?page=1&page=2&limit=1",
    ] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn take_order_marks_order_taken() {
    let (app, store) = setup();
    add_orders(&store, 1).await;

    let response = app
        .clone()
        .oneshot(json_request("PATCH", "/orders/1", json!({ "status": "TAKEN" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "SUCCESS" }));

    let response = app
        .oneshot(get_request("/orders?page=1&limit=1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["status"], "TAKEN");
}

#[tokio::test]
async fn taking_twice_returns_409() {
    let (app, store) = setup();
    add_orders(&store, 1).await;

    let first = app
        .clone()
        .oneshot(json_request("PATCH", "/orders/1", json!({ "status": "TAKEN" })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(json_request("PATCH", "/orders/1", json!({ "status": "TAKEN" })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert!(body["error"].as_str().unwrap().contains("already taken"));
}

#[tokio::test]
async fn take_unknown_order_returns_404() {
    let (app, _store) = setup();
    let response = app
        .oneshot(json_request("PATCH", "/orders/77", json!({ "status": "TAKEN" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn take_order_rejects_bad_input() {
    let (app, store) = setup();
    add_orders(&store, 1).await;

    let non_numeric = app
        .clone()
        .oneshot(json_request("PATCH", "/orders/abc", json!({ "status": "TAKEN" })))
        .await
        .unwrap();
    assert_eq!(non_numeric.status(), StatusCode::BAD_REQUEST);

    let malformed = app
        .clone()
        .oneshot(raw_request("PATCH", "/orders/1", "{status: TAKEN}"))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let unsupported = app
        .clone()
        .oneshot(json_request("PATCH", "/orders/1", json!({ "status": "DELIVERED" })))
        .await
        .unwrap();
    assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get_request("/orders?page=1&limit=1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body[0]["status"], "UNASSIGNED");
}

#[tokio::test]
async fn concurrent_take_requests_have_one_winner() {
    let (app, store) = setup();
    add_orders(&store, 1).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                app.oneshot(json_request("PATCH", "/orders/1", json!({ "status": "TAKEN" })))
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::CONFLICT)
            .count(),
        7
    );
}
