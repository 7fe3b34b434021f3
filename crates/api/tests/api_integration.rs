//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use api::{AppState, JwtVerifier};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog::{CatalogItem, InMemoryCatalog};
use domain::Money;
use jsonwebtoken::{EncodingKey, Header, encode};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use serde_json::{Value, json};
use stats::InMemoryCache;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: Router,
    store: Arc<InMemoryOrderStore>,
    catalog: Arc<InMemoryCatalog>,
}

async fn setup() -> TestApp {
    let store = Arc::new(InMemoryOrderStore::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog
        .insert(CatalogItem::new("1", "Widget", Money::from_cents(2999), 100))
        .await;
    catalog
        .insert(CatalogItem::new("2", "Scarce", Money::from_cents(1000), 1))
        .await;

    let state = Arc::new(AppState::new(
        store.clone(),
        catalog.clone(),
        Arc::new(InMemoryCache::new()),
        Duration::from_secs(300),
        JwtVerifier::new(SECRET),
    ));
    TestApp {
        router: api::create_app(state, get_metrics_handle()),
        store,
        catalog,
    }
}

fn token_for(user: i64) -> String {
    let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 3600;
    encode(
        &Header::default(),
        &json!({"sub": user.to_string(), "exp": exp}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    user: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("authorization", format!("Bearer {}", token_for(user)));
    }
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&body).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn place(app: &TestApp, user: i64, item: i64, quantity: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/orders",
        Some(user),
        Some(json!({"items": [{"item_id": item, "quantity": quantity}]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["order"].clone()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "service": "order-service"}));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let app = setup().await;

    let (status, _) = send(&app, "GET", "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/orders/stats")
                .header("authorization", "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_order() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(7),
        Some(json!({"user_id": 99, "items": [{"itemId": 1, "quantity": 2}]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Order created successfully");
    let order = &body["order"];
    assert_eq!(order["user_id"], 7);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_amount"], 59.98);
    assert_eq!(order["items"][0]["item_id"], "1");
    assert_eq!(order["items"][0]["name"], "Widget");
    assert_eq!(order["items"][0]["price"], 29.99);
    assert_eq!(order["items"][0]["subtotal"], 59.98);
}

#[tokio::test]
async fn test_create_order_legacy_field_names() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(7),
        Some(json!({"products": [{"product_id": 1, "quantity": 1}]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn test_create_order_validation_errors() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(7),
        Some(json!({"items": [{"quantity": -1}, {"item_id": 1}]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 3);
    assert_eq!(app.store.order_count().await, 0);

    let (status, body) = send(&app, "POST", "/api/orders", Some(7), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Items are required"]));
}

#[tokio::test]
async fn test_create_order_malformed_json() {
    let app = setup().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header("authorization", format!("Bearer {}", token_for(7)))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_order_insufficient_stock() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(7),
        Some(json!({"items": [{"item_id": 2, "quantity": 10}]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Insufficient stock for item 2");
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_order_unknown_item() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(7),
        Some(json!({"items": [{"item_id": 1, "quantity": 1}, {"item_id": 5, "quantity": 1}]})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Item 5 not found");
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_order_catalog_unavailable() {
    let app = setup().await;
    app.catalog.set_unavailable(true);

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(7),
        Some(json!({"items": [{"item_id": 1, "quantity": 1}]})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Catalog service unavailable");
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_get_order_is_owner_scoped() {
    let app = setup().await;
    let order = place(&app, 7, 1, 1).await;
    let uri = format!("/api/orders/{}", order["id"]);

    let (status, body) = send(&app, "GET", &uri, Some(7), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["id"], order["id"]);

    let (status, body) = send(&app, "GET", &uri, Some(8), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found");

    let (status, _) = send(&app, "GET", "/api/orders/999", Some(7), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/orders/abc", Some(7), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_orders() {
    let app = setup().await;
    for _ in 0..3 {
        place(&app, 7, 1, 1).await;
    }
    place(&app, 8, 1, 1).await;

    let (status, body) = send(&app, "GET", "/api/orders?page=1&per_page=2", Some(7), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pages"], 2);
    assert_eq!(body["orders"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/orders?page=2&pageSize=2", Some(7), None).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/orders?page=5", Some(7), None).await;
    assert_eq!(body["orders"], json!([]));
    assert_eq!(body["total"], 3);

    let (_, body) = send(&app, "GET", "/api/orders?status=shipped", Some(7), None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_list_orders_bad_params() {
    let app = setup().await;

    let (status, _) = send(&app, "GET", "/api/orders?page=0", Some(7), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/orders?status=lost", Some(7), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Must be one of"));
}

#[tokio::test]
async fn test_update_status() {
    let app = setup().await;
    let order = place(&app, 7, 1, 1).await;
    let uri = format!("/api/orders/{}/status", order["id"]);

    let (status, body) = send(&app, "PUT", &uri, Some(7), Some(json!({"status": "processing"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order status updated successfully");
    assert_eq!(body["order"]["status"], "processing");

    let (status, body) = send(&app, "PUT", &uri, Some(7), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Status is required");

    let (status, _) = send(&app, "PUT", &uri, Some(7), Some(json!({"status": "lost"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", &uri, Some(7), Some(json!({"status": "pending"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", &uri, Some(8), Some(json!({"status": "shipped"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_after_shipping_is_rejected() {
    let app = setup().await;
    let order = place(&app, 7, 1, 1).await;
    let id = &order["id"];

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}/status"),
        Some(7),
        Some(json!({"status": "shipped"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "DELETE", &format!("/api/orders/{id}"), Some(7), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot cancel order in shipped status");

    let (_, body) = send(&app, "GET", &format!("/api/orders/{id}"), Some(7), None).await;
    assert_eq!(body["order"]["status"], "shipped");
}

#[tokio::test]
async fn test_cancel_order() {
    let app = setup().await;
    let order = place(&app, 7, 1, 1).await;
    let uri = format!("/api/orders/{}", order["id"]);

    let (status, _) = send(&app, "DELETE", &uri, Some(8), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "DELETE", &uri, Some(7), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order cancelled successfully");
    assert_eq!(body["order"]["status"], "cancelled");

    let (status, _) = send(&app, "DELETE", &uri, Some(7), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats() {
    let app = setup().await;

    let (status, body) = send(&app, "GET", "/api/orders/stats", Some(7), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"order_count": 0, "total_spent": 0.0, "pending_count": 0, "completed_count": 0})
    );

    place(&app, 7, 1, 2).await;
    let second = place(&app, 7, 1, 1).await;
    place(&app, 8, 1, 1).await;

    let (_, body) = send(&app, "GET", "/api/orders/stats", Some(7), None).await;
    assert_eq!(body["order_count"], 2);
    assert_eq!(body["total_spent"], 89.97);
    assert_eq!(body["pending_count"], 2);

    send(
        &app,
        "PUT",
        &format!("/api/orders/{}/status", second["id"]),
        Some(7),
        Some(json!({"status": "delivered"})),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/orders/stats", Some(7), None).await;
    assert_eq!(body["pending_count"], 1);
    assert_eq!(body["completed_count"], 1);
}
