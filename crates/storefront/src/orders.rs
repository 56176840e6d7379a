//! Order history.
//!
//! The order list endpoint returns summaries only. Each order on the page is
//! looked up individually for its shipping address and payment method; a
//! failed lookup keeps the summary as it was.

use bazaar_core::OrderId;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::{ApiError, OrderHistory, OrderPage};

/// Detail fields copied from the full order onto its summary.
const DETAIL_FIELDS: [&str; 2] = ["shipping_address", "payment_method"];

/// Fetch page `page` of the shopper's orders, each enriched with its
/// shipping address and payment method.
///
/// # Errors
///
/// Returns an error if the page itself cannot be fetched.
#[instrument(skip(history))]
pub async fn order_history<H: OrderHistory>(
    history: &H,
    page: u32,
) -> Result<OrderPage, ApiError> {
    let mut listing = history.fetch_orders(page).await?;

    let details = listing.data.iter().map(|order| async move {
        let id = order_id(order)?;
        match history.fetch_order(id).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                debug!(order_id = %id, error = %e, "Order detail lookup failed");
                None
            }
        }
    });
    let details = join_all(details).await;

    for (order, detail) in listing.data.iter_mut().zip(details) {
        if let (Some(detail), Some(summary)) = (detail, order.as_object_mut()) {
            for field in DETAIL_FIELDS {
                if let Some(value) = detail.get(field) {
                    summary.insert(field.to_string(), value.clone());
                }
            }
        }
    }
    Ok(listing)
}

/// The id of an order payload, numeric or numeric string.
#[must_use]
pub fn order_id(order: &Value) -> Option<OrderId> {
    match order.get("id")? {
        Value::Number(n) => n.as_i64().map(OrderId::new),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::api::Pagination;

    struct FakeHistory {
        lookups: AtomicUsize,
    }

    impl OrderHistory for FakeHistory {
        async fn fetch_orders(&self, page: u32) -> Result<OrderPage, ApiError> {
            Ok(OrderPage {
                data: vec![
                    json!({"id": 1, "status": "pending"}),
                    json!({"id": 2, "status": "shipped"}),
                    json!({"status": "unknown"}),
                ],
                pagination: Some(Pagination {
                    current_page: page,
                    last_page: 4,
                }),
            })
        }

        async fn fetch_order(&self, id: OrderId) -> Result<Value, ApiError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if id.as_i64() == 2 {
                return Err(ApiError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(json!({
                "id": id.as_i64(),
                "status": "pending",
                "shipping_address": "4 Elm Rd",
                "payment_method": "cod",
            }))
        }
    }

    #[tokio::test]
    async fn test_history_merges_details_and_keeps_failed_summaries() {
        let history = FakeHistory {
            lookups: AtomicUsize::new(0),
        };
        let page = order_history(&history, 2).await.unwrap();

        assert_eq!(page.last_page(), 4);
        assert_eq!(page.data[0]["shipping_address"], "4 Elm Rd");
        assert_eq!(page.data[0]["payment_method"], "cod");
        assert_eq!(page.data[1], json!({"id": 2, "status": "shipped"}));
        assert_eq!(page.data[2], json!({"status": "unknown"}));
        assert_eq!(history.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_order_id_accepts_numeric_strings() {
        assert_eq!(order_id(&json!({"id": 7})), Some(OrderId::new(7)));
        assert_eq!(order_id(&json!({"id": " 8 "})), Some(OrderId::new(8)));
        assert_eq!(order_id(&json!({"id": "x"})), None);
        assert_eq!(order_id(&json!({})), None);
    }
}
