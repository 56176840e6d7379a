//! Storefront REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; bearer token from [`ClientConfig`]
//! - The backend is the source of truth for prices, stock and order state
//! - Product lookups are cached in memory via `moka` (5 minute TTL), since
//!   image enrichment may ask for the same product repeatedly
//!
//! The cart, checkout and order history code depend on the
//! [`ProductCatalog`], [`OrderGateway`] and [`OrderHistory`] traits rather
//! than on [`ApiClient`] directly, so they can be driven by fakes in tests.

pub mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bazaar_core::{OrderId, OrderStatusRequest, ProductId};
use moka::future::Cache;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::ClientConfig;

pub use types::{
    DataEnvelope, ErrorBody, OrderLine, OrderPage, OrderRequest, Pagination, StatusUpdate,
};

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response or build request.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// The message to show the shopper: the API's own message when it sent one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Source of product details.
pub trait ProductCatalog: Send + Sync {
    /// Fetch the raw product payload for `id`.
    fn fetch_product(&self, id: ProductId) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// Sink for new orders.
pub trait OrderGateway: Send + Sync {
    /// Submit an order, returning the created order as sent by the backend.
    fn create_order(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// Source of the shopper's past orders.
pub trait OrderHistory: Send + Sync {
    /// Fetch one page of orders.
    fn fetch_orders(&self, page: u32) -> impl Future<Output = Result<OrderPage, ApiError>> + Send;

    /// Fetch the full record of one order.
    fn fetch_order(&self, id: OrderId) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    products: Cache<ProductId, Value>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(500)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                products,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Fetch a single product (`GET /v1/products/{id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no `data`.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Value, ApiError> {
        if let Some(product) = self.inner.products.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let response = self
            .inner
            .client
            .get(self.url(&format!("/v1/products/{id}")))
            .send()
            .await?;
        let envelope: DataEnvelope<Value> = read_json(response).await?;

        self.inner.products.insert(id, envelope.data.clone()).await;
        Ok(envelope.data)
    }

    /// Create an order (`POST /v1/orders`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the order.
    #[instrument(skip(self, order), fields(lines = order.products.len()))]
    pub async fn post_order(&self, order: &OrderRequest) -> Result<Value, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/v1/orders"))
            .json(order)
            .send()
            .await?;
        let envelope: DataEnvelope<Value> = read_json(response).await?;
        Ok(envelope.data)
    }

    /// Fetch one page of the shopper's orders (`GET /v1/orders?page=N`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an order page.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, page: u32) -> Result<OrderPage, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("/v1/orders?page={}", page.max(1))))
            .send()
            .await?;
        read_json(response).await
    }

    /// Fetch a single order with its shipping and payment details
    /// (`GET /v1/orders/{id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no `data`.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<Value, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("/v1/orders/{id}")))
            .send()
            .await?;
        let envelope: DataEnvelope<Value> = read_json(response).await?;
        Ok(envelope.data)
    }

    /// Ask the backend to move an order to a new status (`PUT /v1/orders/{id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses the change.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn request_order_status(
        &self,
        id: OrderId,
        status: OrderStatusRequest,
    ) -> Result<Value, ApiError> {
        let response = self
            .inner
            .client
            .put(self.url(&format!("/v1/orders/{id}")))
            .json(&StatusUpdate { status })
            .send()
            .await?;
        let body: Value = read_json(response).await?;
        Ok(body)
    }
}

impl ProductCatalog for ApiClient {
    async fn fetch_product(&self, id: ProductId) -> Result<Value, ApiError> {
        self.get_product(id).await
    }
}

impl OrderGateway for ApiClient {
    async fn create_order(&self, order: &OrderRequest) -> Result<Value, ApiError> {
        self.post_order(order).await
    }
}

impl OrderHistory for ApiClient {
    async fn fetch_orders(&self, page: u32) -> Result<OrderPage, ApiError> {
        self.list_orders(page).await
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Value, ApiError> {
        self.get_order(id).await
    }
}

/// Turn a response into `T`, mapping non-2xx statuses to [`ApiError::Api`].
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| text.chars().take(200).collect());
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            body = %text.chars().take(500).collect::<String>(),
            "Unexpected API response body"
        );
        ApiError::Parse(e.to_string())
    })
}
