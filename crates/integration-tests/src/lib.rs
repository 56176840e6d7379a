//! Integration tests for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! Everything runs in-process: the log server and a stand-in for the
//! storefront REST API are bound to ephemeral ports on 127.0.0.1, and file
//! storage lives in throwaway directories under the system temp dir.
//!
//! # Test Categories
//!
//! - `cart_persistence` - File-backed cart shared between store instances
//! - `storefront_api` - API client, image enrichment and order placement
//! - `log_server` - Error reports delivered over HTTP to the sidecar

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bazaar_storefront::ClientConfig;
use serde_json::{Value, json};

// =============================================================================
// Temp Directories
// =============================================================================

/// A unique directory under the system temp dir, removed on drop.
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// =============================================================================
// Servers
// =============================================================================

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Start the log server writing into `logs_dir`.
pub async fn spawn_log_server(logs_dir: &Path) -> SocketAddr {
    let config = bazaar_log_server::LogServerConfig::local(logs_dir);
    let state = bazaar_log_server::AppState::new(&config).unwrap();
    serve(bazaar_log_server::app(state, &config)).await
}

/// Client configuration pointing at a mock API and, optionally, a log server.
#[must_use]
pub fn client_config(api: SocketAddr, log_server: Option<SocketAddr>) -> ClientConfig {
    let mut config = ClientConfig::for_api(&format!("http://{api}/api")).unwrap();
    // Port 9 (discard) refuses connections, so reports fail fast.
    let log_server = log_server.map_or_else(|| "127.0.0.1:9".to_string(), |addr| addr.to_string());
    config.log_server_url = format!("http://{log_server}").parse().unwrap();
    config.http_timeout = std::time::Duration::from_secs(5);
    config
}

// =============================================================================
// Mock Storefront API
// =============================================================================

/// Shared state of the mock API, inspectable from tests.
#[derive(Clone, Default)]
pub struct MockApi {
    products: Arc<Mutex<HashMap<i64, Value>>>,
    product_hits: Arc<AtomicUsize>,
    orders: Arc<Mutex<Vec<Value>>>,
    status_updates: Arc<Mutex<Vec<(i64, Value)>>>,
    reject_orders: Arc<AtomicBool>,
    broken_details: Arc<Mutex<Vec<i64>>>,
}

/// Orders per page of `GET /api/v1/orders`.
pub const ORDERS_PER_PAGE: usize = 2;

impl MockApi {
    /// Register a product payload served at `/api/v1/products/{id}`.
    pub fn add_product(&self, id: i64, product: Value) {
        self.products.lock().unwrap().insert(id, product);
    }

    /// Answer order creation with 422 from now on.
    pub fn reject_orders(&self) {
        self.reject_orders.store(true, Ordering::SeqCst);
    }

    /// Number of product requests that reached the server.
    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.product_hits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.orders.lock().unwrap().clone()
    }

    /// Fail detail lookups of order `id` with 500 from now on.
    pub fn break_order_detail(&self, id: i64) {
        self.broken_details.lock().unwrap().push(id);
    }

    #[must_use]
    pub fn status_updates(&self) -> Vec<(i64, Value)> {
        self.status_updates.lock().unwrap().clone()
    }

    /// Start serving; returns the bound address.
    pub async fn spawn(&self) -> SocketAddr {
        let router = Router::new()
            .route("/api/v1/products/{id}", get(get_product))
            .route("/api/v1/orders", post(create_order).get(list_orders))
            .route("/api/v1/orders/{id}", get(get_order).put(update_order))
            .with_state(self.clone());
        serve(router).await
    }
}

async fn get_product(
    State(api): State<MockApi>,
    UrlPath(id): UrlPath<i64>,
) -> (StatusCode, Json<Value>) {
    api.product_hits.fetch_add(1, Ordering::SeqCst);
    match api.products.lock().unwrap().get(&id) {
        Some(product) => (
            StatusCode::OK,
            Json(json!({"status": "success", "data": product})),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "error", "message": "Product not found"})),
        ),
    }
}

async fn create_order(
    State(api): State<MockApi>,
    Json(order): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if api.reject_orders.load(Ordering::SeqCst) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"status": "error", "message": "Insufficient stock"})),
        );
    }
    let mut orders = api.orders.lock().unwrap();
    orders.push(order);
    let id = 500 + orders.len();
    (
        StatusCode::CREATED,
        Json(json!({"status": "success", "data": {"id": id, "status": "pending"}})),
    )
}

async fn update_order(
    State(api): State<MockApi>,
    UrlPath(id): UrlPath<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let status = body["status"].clone();
    api.status_updates.lock().unwrap().push((id, body));
    Json(json!({"status": "success", "data": {"id": id, "status": status}}))
}

/// Placed orders as summaries, `ORDERS_PER_PAGE` at a time.
async fn list_orders(
    State(api): State<MockApi>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let page = params
        .get("page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let orders = api.orders.lock().unwrap();
    let summaries: Vec<Value> = orders
        .iter()
        .enumerate()
        .skip((page - 1) * ORDERS_PER_PAGE)
        .take(ORDERS_PER_PAGE)
        .map(|(i, order)| {
            json!({
                "id": 501 + i,
                "status": "pending",
                "products": order["products"],
            })
        })
        .collect();
    let last_page = orders.len().div_ceil(ORDERS_PER_PAGE).max(1);
    Json(json!({
        "status": "success",
        "data": summaries,
        "pagination": {"current_page": page, "last_page": last_page},
    }))
}

async fn get_order(
    State(api): State<MockApi>,
    UrlPath(id): UrlPath<i64>,
) -> (StatusCode, Json<Value>) {
    if api.broken_details.lock().unwrap().contains(&id) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "error", "message": "Server error"})),
        );
    }
    let orders = api.orders.lock().unwrap();
    let order = usize::try_from(id - 501).ok().and_then(|i| orders.get(i));
    match order {
        Some(order) => (
            StatusCode::OK,
            Json(json!({"status": "success", "data": {
                "id": id,
                "status": "pending",
                "shipping_address": order["shipping_address"],
                "payment_method": order["payment_method"],
            }})),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "error", "message": "Order not found"})),
        ),
    }
}
