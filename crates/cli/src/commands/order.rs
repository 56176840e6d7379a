//! Order commands.
//!
//! # Usage
//!
//! ```bash
//! bz order place --name "Asha Rao" --email asha@shop.test --phone 9800000000 \
//!     --street "4 Elm Rd" --city Pune --state MH --pincode 411001
//!
//! bz order status 501 cancelled
//!
//! bz order list --page 2
//! ```

use bazaar_core::{OrderId, OrderStatusRequest};
use std::fmt::Write as _;

use bazaar_storefront::api::{OrderGateway, OrderHistory};
use bazaar_storefront::checkout::{
    CheckoutError, CheckoutForm, CheckoutSelection, build_order, place_order,
};
use bazaar_storefront::orders::{order_history, order_id};
use serde_json::Value;

use super::{CliError, Context};

/// Place an order for the staged items, or the whole cart if nothing is staged.
pub async fn place(ctx: &Context, form: &CheckoutForm) -> Result<String, CliError> {
    let api = ctx.api()?;
    place_with(ctx, &api, form).await
}

/// Place an order through `gateway`.
///
/// A staged selection that fails validation or submission is staged again so
/// the next attempt buys the same thing.
pub async fn place_with<G: OrderGateway>(
    ctx: &Context,
    gateway: &G,
    form: &CheckoutForm,
) -> Result<String, CliError> {
    let was_staged = !ctx.store.get_checkout_items().is_empty();
    let selection = CheckoutSelection::prefill(&ctx.store)?;

    let result = match build_order(&selection, form) {
        Ok(order) => place_order(&ctx.store, gateway, &order).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(created) => {
            let id = created.get("id").map(ToString::to_string);
            Ok(id.map_or_else(
                || "Order placed".to_string(),
                |id| format!("Order {id} placed"),
            ))
        }
        Err(e) => {
            if was_staged {
                let selected: Vec<_> = selection
                    .items()
                    .iter()
                    .filter(|item| item.quantity > 0)
                    .cloned()
                    .collect();
                ctx.store.set_checkout_items(&selected)?;
            }
            match e {
                CheckoutError::Api(api_error) => Err(ctx.report("Placing order", &api_error).await),
                other => Err(other.into()),
            }
        }
    }
}

/// Ask the backend to move an order to `status`.
pub async fn status(
    ctx: &Context,
    id: OrderId,
    status: OrderStatusRequest,
) -> Result<String, CliError> {
    let api = ctx.api()?;
    match api.request_order_status(id, status).await {
        Ok(_) => Ok(format!("Order {id} status set to {status}")),
        Err(e) => Err(ctx.report("Updating order status", &e).await),
    }
}

/// List one page of past orders.
pub async fn list(ctx: &Context, page: u32) -> Result<String, CliError> {
    let api = ctx.api()?;
    list_with(ctx, &api, page).await
}

/// List one page of past orders from `history`.
pub async fn list_with<H: OrderHistory>(
    ctx: &Context,
    history: &H,
    page: u32,
) -> Result<String, CliError> {
    let page = page.max(1);
    let listing = match order_history(history, page).await {
        Ok(listing) => listing,
        Err(e) => return Err(ctx.report("Fetching orders", &e).await),
    };
    if listing.data.is_empty() {
        return Ok(format!("No orders on page {page}"));
    }

    let mut out = String::new();
    for order in &listing.data {
        let id = order_id(order).map_or_else(|| "?".to_string(), |id| id.to_string());
        let _ = write!(
            out,
            "{id:>8}  {:<16}  {:>10}  {}",
            text(order, "status"),
            total(order),
            text(order, "payment_method")
        );
        out.push('\n');
        if let Some(address) = order.get("shipping_address").and_then(Value::as_str) {
            let _ = writeln!(out, "          {address}");
        }
    }
    let _ = write!(out, "Page {page} of {}", listing.last_page());
    Ok(out)
}

fn text<'a>(order: &'a Value, field: &str) -> &'a str {
    order.get(field).and_then(Value::as_str).unwrap_or("-")
}

/// The order total as sent, under either name the backend uses.
fn total(order: &Value) -> String {
    ["total_amount", "total_price"]
        .iter()
        .filter_map(|field| order.get(*field))
        .find_map(|value| match value {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use bazaar_core::{PaymentMethod, ProductId};
    use bazaar_storefront::api::{ApiError, OrderPage, OrderRequest, Pagination};
    use bazaar_storefront::checkout::ShippingAddress;
    use serde_json::{Value, json};

    use super::*;
    use crate::commands::tests::memory_context;
    use crate::commands::{cart, checkout};

    const MUG: &str = r#"{"id": 7, "name": "Mug", "price": 8.5}"#;
    const TEE: &str = r#"{"id": 9, "name": "Tee", "price": 15}"#;

    #[derive(Default)]
    struct FakeGateway {
        reject: bool,
        orders: Mutex<Vec<OrderRequest>>,
    }

    impl OrderGateway for FakeGateway {
        async fn create_order(&self, order: &OrderRequest) -> Result<Value, ApiError> {
            self.orders.lock().unwrap().push(order.clone());
            if self.reject {
                return Err(ApiError::Parse("rejected".to_string()));
            }
            Ok(json!({"id": 501}))
        }
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Asha Rao".to_string(),
            email: "asha@shop.test".to_string(),
            phone: "9800000000".to_string(),
            address: ShippingAddress {
                street: "4 Elm Rd".to_string(),
                city: "Pune".to_string(),
                state: "MH".to_string(),
                pincode: "411001".to_string(),
                ..ShippingAddress::default()
            },
            payment_method: PaymentMethod::Cod,
        }
    }

    #[tokio::test]
    async fn test_place_from_cart_clears_cart() {
        let ctx = memory_context();
        cart::add(&ctx, ProductId::new(7), "2", Some(MUG)).await.unwrap();
        let gateway = FakeGateway::default();

        let message = place_with(&ctx, &gateway, &form()).await.unwrap();
        assert_eq!(message, "Order 501 placed");
        assert_eq!(ctx.store.cart_count(), 0);

        let orders = gateway.orders.lock().unwrap();
        assert_eq!(orders[0].products.len(), 1);
        assert_eq!(orders[0].products[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_place_prefers_staged_buy_now() {
        let ctx = memory_context();
        cart::add(&ctx, ProductId::new(7), "1", Some(MUG)).await.unwrap();
        checkout::buy_now(&ctx, ProductId::new(9), Some(TEE)).await.unwrap();
        let gateway = FakeGateway::default();

        place_with(&ctx, &gateway, &form()).await.unwrap();

        let orders = gateway.orders.lock().unwrap();
        assert_eq!(orders[0].products[0].id, ProductId::new(9));
        assert!(ctx.store.get_checkout_items().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_form_restages_selection() {
        let ctx = memory_context();
        checkout::buy_now(&ctx, ProductId::new(9), Some(TEE)).await.unwrap();
        let mut incomplete = form();
        incomplete.address.city = String::new();

        let result = place_with(&ctx, &FakeGateway::default(), &incomplete).await;
        assert!(matches!(
            result,
            Err(CliError::Checkout(CheckoutError::MissingField("city")))
        ));
        assert_eq!(ctx.store.get_checkout_items().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_order_keeps_cart() {
        let ctx = memory_context();
        cart::add(&ctx, ProductId::new(7), "1", Some(MUG)).await.unwrap();
        let gateway = FakeGateway {
            reject: true,
            ..FakeGateway::default()
        };

        let result = place_with(&ctx, &gateway, &form()).await;
        assert!(matches!(result, Err(CliError::Api(_))));
        assert_eq!(ctx.store.cart_count(), 1);
        assert!(ctx.store.get_checkout_items().is_empty());
    }

    #[tokio::test]
    async fn test_place_with_empty_cart() {
        let ctx = memory_context();
        let result = place_with(&ctx, &FakeGateway::default(), &form()).await;
        assert!(matches!(
            result,
            Err(CliError::Checkout(CheckoutError::EmptySelection))
        ));
    }

    struct FakeHistory {
        orders: Vec<Value>,
    }

    impl OrderHistory for FakeHistory {
        async fn fetch_orders(&self, page: u32) -> Result<OrderPage, ApiError> {
            if page > 1 {
                return Ok(OrderPage::default());
            }
            Ok(OrderPage {
                data: self.orders.clone(),
                pagination: Some(Pagination {
                    current_page: 1,
                    last_page: 1,
                }),
            })
        }

        async fn fetch_order(&self, id: OrderId) -> Result<Value, ApiError> {
            Ok(json!({
                "id": id.as_i64(),
                "shipping_address": "Street: 4 Elm Rd",
                "payment_method": "upi",
            }))
        }
    }

    #[tokio::test]
    async fn test_list_renders_orders_with_details() {
        let ctx = memory_context();
        let history = FakeHistory {
            orders: vec![
                json!({"id": 501, "status": "pending", "total_amount": "23.50"}),
                json!({"id": "502", "status": "shipped", "total_price": 15}),
            ],
        };

        let out = list_with(&ctx, &history, 0).await.unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("501"));
        assert!(lines[0].contains("pending"));
        assert!(lines[0].contains("23.50"));
        assert!(lines[0].ends_with("upi"));
        assert_eq!(lines[1].trim(), "Street: 4 Elm Rd");
        assert!(lines[2].contains("shipped"));
        assert!(lines[2].contains("15"));
        assert_eq!(lines[4], "Page 1 of 1");
    }

    #[tokio::test]
    async fn test_list_past_last_page() {
        let ctx = memory_context();
        let history = FakeHistory { orders: Vec::new() };
        assert_eq!(list_with(&ctx, &history, 3).await.unwrap(), "No orders on page 3");
    }
}
