//! Cart and checkout staging entries.

use bazaar_core::{Price, ProductId};
use serde::{Deserialize, Serialize};

use crate::normalize::ProductSnapshot;
use crate::schema::StoredItem;

/// One product in the cart.
///
/// `price` is the value seen when the product was added; `image` is empty
/// until a URL is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl LineItem {
    /// Build a line item from a resolved product.
    #[must_use]
    pub fn from_snapshot(product: &ProductSnapshot, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
        }
    }

    /// Whether an image URL is known for this item.
    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image.trim().is_empty()
    }
}

impl StoredItem for LineItem {
    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

/// One entry of the checkout staging snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
}

impl CheckoutItem {
    /// Stage a single unit of a product, as "Buy Now" does.
    #[must_use]
    pub fn single(product: &ProductSnapshot) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
            image: product.image.clone(),
        }
    }
}

impl From<&LineItem> for CheckoutItem {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
        }
    }
}

impl StoredItem for CheckoutItem {
    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}
