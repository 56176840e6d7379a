//! Order creation from the cart or a staged "Buy Now" snapshot.
//!
//! Flow:
//!
//! 1. [`CheckoutSelection::prefill`] consumes the staging snapshot, falling
//!    back to the cart when nothing was staged.
//! 2. [`build_order`] validates the contact form and assembles an
//!    [`OrderRequest`].
//! 3. [`place_order`] submits it. The cart is cleared only once the backend
//!    has accepted the order; on failure it is left intact for a retry.

use bazaar_core::{Email, EmailError, PaymentMethod, ProductId};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, OrderGateway, OrderLine, OrderRequest};
use crate::cart::{CartStore, CheckoutItem};
use crate::storage::StorageError;

/// Errors that stop an order from being placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No product line with a positive quantity was selected.
    #[error("Please select at least one product with quantity")]
    EmptySelection,

    /// A required form field is blank.
    #[error("Please enter {0}")]
    MissingField(&'static str),

    /// The contact email is malformed.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The backend rejected the order or could not be reached.
    #[error("Order failed: {0}")]
    Api(#[from] ApiError),

    /// Local state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Selection
// =============================================================================

/// The products an order will be placed for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutSelection {
    items: Vec<CheckoutItem>,
}

impl CheckoutSelection {
    /// Start a selection from explicit items.
    #[must_use]
    pub const fn new(items: Vec<CheckoutItem>) -> Self {
        Self { items }
    }

    /// Build the selection the order screen opens with.
    ///
    /// A staged snapshot wins and is erased so it cannot leak into a later
    /// checkout. Without one, the whole cart is selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging snapshot could not be erased.
    pub fn prefill(store: &CartStore) -> Result<Self, StorageError> {
        let staged = store.take_checkout_items()?;
        if !staged.is_empty() {
            return Ok(Self::new(staged));
        }
        Ok(Self::new(
            store.get_cart().iter().map(CheckoutItem::from).collect(),
        ))
    }

    /// Items currently selected.
    #[must_use]
    pub fn items(&self) -> &[CheckoutItem] {
        &self.items
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Change the quantity of a selected product. Zero deselects it at
    /// submission time. Returns `false` if the product is not selected.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> bool {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .is_some_and(|item| {
                item.quantity = quantity;
                true
            })
    }

    /// Drop a product from the selection. Returns `false` if it was absent.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Order lines for every item with a positive quantity.
    #[must_use]
    pub fn lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .filter(|item| item.quantity > 0)
            .map(|item| OrderLine {
                id: item.id,
                quantity: item.quantity,
            })
            .collect()
    }
}

// =============================================================================
// Form
// =============================================================================

/// Delivery address as entered on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingAddress {
    pub street: String,
    pub landmark: String,
    pub village: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl ShippingAddress {
    /// Single-line form sent to the backend, e.g.
    /// `Street: 4 Elm Rd | City: Pune | State: MH | Pincode/Area: 411001`.
    /// Blank parts are skipped.
    #[must_use]
    pub fn compose(&self) -> String {
        [
            ("Street", &self.street),
            ("Landmark", &self.landmark),
            ("Village", &self.village),
            ("City", &self.city),
            ("State", &self.state),
            ("Pincode/Area", &self.pincode),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| format!("{label}: {}", value.trim()))
        .collect::<Vec<_>>()
        .join(" | ")
    }
}

/// Contact and delivery details for an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

fn required(value: &str, field: &'static str) -> Result<String, CheckoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CheckoutError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Validate the form and assemble the order body.
///
/// Checks run in the order the form shows them, so the first blank field is
/// the one reported.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptySelection`], [`CheckoutError::MissingField`]
/// or [`CheckoutError::InvalidEmail`].
pub fn build_order(
    selection: &CheckoutSelection,
    form: &CheckoutForm,
) -> Result<OrderRequest, CheckoutError> {
    let products = selection.lines();
    if products.is_empty() {
        return Err(CheckoutError::EmptySelection);
    }

    let contact_name = required(&form.name, "your name")?;
    let email = required(&form.email, "your email")?;
    let contact_phone = required(&form.phone, "your phone number")?;
    required(&form.address.street, "street address")?;
    required(&form.address.city, "city")?;
    required(&form.address.state, "state")?;
    required(&form.address.pincode, "pincode / area code")?;

    Ok(OrderRequest {
        products,
        shipping_address: form.address.compose(),
        payment_method: form.payment_method,
        contact_name,
        contact_email: Email::parse(&email)?,
        contact_phone,
    })
}

/// Submit an order and clear the cart once it is accepted.
///
/// # Errors
///
/// Returns [`CheckoutError::Api`] if the backend rejects the order; the cart
/// is left untouched in that case.
#[instrument(skip_all, fields(lines = order.products.len()))]
pub async fn place_order<G: OrderGateway>(
    store: &CartStore,
    gateway: &G,
    order: &OrderRequest,
) -> Result<Value, CheckoutError> {
    let created = gateway.create_order(order).await?;
    info!("Order placed");

    // The order exists at this point, so a failed clear is not reported as a
    // failed checkout.
    if let Err(e) = store.clear_cart() {
        warn!(error = %e, "Order placed but cart could not be cleared");
    }
    Ok(created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::normalize::ProductSnapshot;

    struct RecordingGateway {
        fail_with: Option<String>,
        orders: Mutex<Vec<OrderRequest>>,
    }

    impl RecordingGateway {
        fn accepting() -> Self {
            Self {
                fail_with: None,
                orders: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                orders: Mutex::new(Vec::new()),
            }
        }
    }

    impl OrderGateway for RecordingGateway {
        async fn create_order(&self, order: &OrderRequest) -> Result<Value, ApiError> {
            self.orders.lock().unwrap().push(order.clone());
            match &self.fail_with {
                Some(message) => Err(ApiError::Api {
                    status: 422,
                    message: message.clone(),
                }),
                None => Ok(json!({"id": 501, "status": "pending"})),
            }
        }
    }

    fn snapshot(id: i64) -> ProductSnapshot {
        ProductSnapshot::from_json(&json!({"id": id, "name": "Item", "price": 12})).unwrap()
    }

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            name: "Asha Rao".to_string(),
            email: " asha@shop.test ".to_string(),
            phone: "9800000000".to_string(),
            address: ShippingAddress {
                street: "4 Elm Rd".to_string(),
                landmark: String::new(),
                village: " ".to_string(),
                city: "Pune".to_string(),
                state: "MH".to_string(),
                pincode: "411001".to_string(),
            },
            payment_method: PaymentMethod::Cod,
        }
    }

    #[test]
    fn test_prefill_prefers_staged_snapshot() {
        let store = CartStore::in_memory();
        store.add_to_cart(&snapshot(1), 3).unwrap();
        store.stage_buy_now(&snapshot(2)).unwrap();

        let selection = CheckoutSelection::prefill(&store).unwrap();
        assert_eq!(selection.lines(), vec![OrderLine {
            id: ProductId::new(2),
            quantity: 1
        }]);
        assert!(store.get_checkout_items().is_empty());
        assert_eq!(store.cart_count(), 3);
    }

    #[test]
    fn test_prefill_falls_back_to_cart() {
        let store = CartStore::in_memory();
        store.add_to_cart(&snapshot(1), 3).unwrap();
        store.add_to_cart(&snapshot(5), 1).unwrap();

        let selection = CheckoutSelection::prefill(&store).unwrap();
        let ids: Vec<_> = selection.items().iter().map(|i| i.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn test_compose_address_skips_blank_parts() {
        let address = filled_form().address;
        assert_eq!(
            address.compose(),
            "Street: 4 Elm Rd | City: Pune | State: MH | Pincode/Area: 411001"
        );
    }

    #[test]
    fn test_build_order_requires_fields_in_form_order() {
        let selection = CheckoutSelection::new(vec![CheckoutItem::single(&snapshot(1))]);

        let mut form = filled_form();
        form.name = "  ".to_string();
        form.address.city = String::new();
        assert!(matches!(
            build_order(&selection, &form),
            Err(CheckoutError::MissingField("your name"))
        ));

        let mut form = filled_form();
        form.address.city = String::new();
        assert!(matches!(
            build_order(&selection, &form),
            Err(CheckoutError::MissingField("city"))
        ));

        let mut form = filled_form();
        form.email = "not-an-email".to_string();
        assert!(matches!(
            build_order(&selection, &form),
            Err(CheckoutError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_build_order_drops_zero_quantity_lines() {
        let mut selection = CheckoutSelection::new(vec![
            CheckoutItem::single(&snapshot(1)),
            CheckoutItem::single(&snapshot(2)),
        ]);
        assert!(selection.set_quantity(ProductId::new(1), 0));
        assert!(!selection.set_quantity(ProductId::new(9), 4));

        let order = build_order(&selection, &filled_form()).unwrap();
        assert_eq!(order.products, vec![OrderLine {
            id: ProductId::new(2),
            quantity: 1
        }]);
        assert_eq!(order.contact_email.as_str(), "asha@shop.test");

        assert!(selection.remove(ProductId::new(2)));
        assert!(matches!(
            build_order(&selection, &filled_form()),
            Err(CheckoutError::EmptySelection)
        ));
    }

    #[test]
    fn test_order_body_shape() {
        let selection = CheckoutSelection::new(vec![CheckoutItem::single(&snapshot(7))]);
        let order = build_order(&selection, &filled_form()).unwrap();
        let body = serde_json::to_value(&order).unwrap();
        assert_eq!(body["products"], json!([{"id": 7, "quantity": 1}]));
        assert_eq!(body["payment_method"], "cod");
        assert_eq!(body["contact_email"], "asha@shop.test");
    }

    #[tokio::test]
    async fn test_successful_order_clears_cart() {
        let store = CartStore::in_memory();
        store.add_to_cart(&snapshot(1), 2).unwrap();
        let selection = CheckoutSelection::prefill(&store).unwrap();
        let order = build_order(&selection, &filled_form()).unwrap();
        let gateway = RecordingGateway::accepting();

        let created = place_order(&store, &gateway, &order).await.unwrap();

        assert_eq!(created["id"], 501);
        assert_eq!(gateway.orders.lock().unwrap().len(), 1);
        assert!(store.get_cart().is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart() {
        let store = CartStore::in_memory();
        store.add_to_cart(&snapshot(1), 2).unwrap();
        let selection = CheckoutSelection::prefill(&store).unwrap();
        let order = build_order(&selection, &filled_form()).unwrap();
        let gateway = RecordingGateway::rejecting("Insufficient stock");

        let err = place_order(&store, &gateway, &order).await.unwrap_err();

        match err {
            CheckoutError::Api(api) => assert_eq!(api.user_message(), "Insufficient stock"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.cart_count(), 2);
    }
}
