//! Request and response bodies of the storefront REST API.

use bazaar_core::{Email, OrderStatusRequest, PaymentMethod, ProductId};
use serde::{Deserialize, Serialize};

/// Standard success wrapper: `{"status": "success", "data": ...}`.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Error body returned by the API on failure.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /v1/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub products: Vec<OrderLine>,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub contact_name: String,
    pub contact_email: Email,
    pub contact_phone: String,
}

/// Body of `PUT /v1/orders/{id}` for shopper-initiated status requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub status: OrderStatusRequest,
}

/// Body of `GET /v1/orders?page=N`: one page of orders plus paging info.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPage {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl OrderPage {
    /// Last page number, 1 when the backend sent no pagination.
    #[must_use]
    pub fn last_page(&self) -> u32 {
        self.pagination.as_ref().map_or(1, |p| p.last_page.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub last_page: u32,
}
