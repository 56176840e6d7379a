//! The cart store.
//!
//! [`CartStore`] owns the shopper's cart and the checkout staging snapshot,
//! both persisted through a [`KeyValueStorage`] backend under the keys
//! [`CART_KEY`] and [`CHECKOUT_KEY`]. It is constructed once at startup and
//! handed to whatever needs it; clones share the same state.
//!
//! # Guarantees
//!
//! - Reads never fail. Missing, unreadable or malformed entries read as empty.
//! - Line item ids are unique. Adding an existing id bumps its quantity, and
//!   duplicate ids passed to [`CartStore::set_cart`] are merged.
//! - The cart and the staging snapshot are independent: clearing one never
//!   touches the other.
//! - Mutations made through one store are serialized, so concurrent tasks in
//!   one process cannot lose each other's updates. Separate processes sharing
//!   a storage directory are not coordinated; the last writer wins.
//!
//! # Example
//!
//! ```rust
//! use bazaar_storefront::cart::CartStore;
//! use bazaar_storefront::normalize::ProductSnapshot;
//!
//! let store = CartStore::in_memory();
//! let mug = ProductSnapshot::from_json(&serde_json::json!({"id": 1, "name": "Mug", "price": 4}))?;
//! store.add_to_cart(&mug, 2)?;
//! store.add_to_cart(&mug, 3)?;
//! assert_eq!(store.get_cart().len(), 1);
//! assert_eq!(store.cart_count(), 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod notify;
mod types;

use std::sync::{Arc, Mutex, PoisonError};

use bazaar_core::ProductId;
use tracing::debug;

pub use notify::{ChangeNotifier, SubscriptionId};
pub use types::{CheckoutItem, LineItem};

use crate::normalize::{ProductSnapshot, clamp_quantity};
use crate::schema::{self, StoredItem};
use crate::storage::{KeyValueStorage, MemoryStorage, StorageError};

/// Storage key for the cart.
pub const CART_KEY: &str = "cartItems";

/// Storage key for the checkout staging snapshot.
pub const CHECKOUT_KEY: &str = "checkoutItems";

/// Persistent cart and checkout staging store.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn KeyValueStorage>,
    notifier: ChangeNotifier,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("notifier", &self.inner.notifier)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store over the given storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                notifier: ChangeNotifier::default(),
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Create a store backed by fresh in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Current cart contents, in insertion order.
    #[must_use]
    pub fn get_cart(&self) -> Vec<LineItem> {
        merge_duplicates(self.read(CART_KEY))
    }

    /// Replace the cart and notify listeners.
    ///
    /// Items with quantity zero are stored with quantity one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn set_cart(&self, items: &[LineItem]) -> Result<(), StorageError> {
        {
            let _guard = self.lock();
            self.write(CART_KEY, merge_duplicates(items.to_vec()))?;
        }
        self.inner.notifier.notify();
        Ok(())
    }

    /// Edit the cart in place while holding the write lock.
    ///
    /// `edit` returns whether it changed anything; only then is the cart
    /// written and listeners notified. Returns what `edit` returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn modify_cart(
        &self,
        edit: impl FnOnce(&mut Vec<LineItem>) -> bool,
    ) -> Result<bool, StorageError> {
        {
            let _guard = self.lock();
            let mut items = self.get_cart();
            if !edit(&mut items) {
                return Ok(false);
            }
            self.write(CART_KEY, merge_duplicates(items))?;
        }
        self.inner.notifier.notify();
        Ok(true)
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing entry for the same id has its quantity increased; otherwise
    /// a new entry is appended. A quantity of zero is treated as one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn add_to_cart(&self, product: &ProductSnapshot, quantity: u32) -> Result<(), StorageError> {
        let quantity = quantity.max(1);
        self.modify_cart(|items| {
            if let Some(existing) = items.iter_mut().find(|item| item.id == product.id) {
                existing.quantity = existing.quantity.saturating_add(quantity);
            } else {
                items.push(LineItem::from_snapshot(product, quantity));
            }
            true
        })?;
        debug!(product_id = %product.id, quantity, "Added to cart");
        Ok(())
    }

    /// Set the quantity of an existing entry, clamped to at least one.
    ///
    /// Returns `false`, writes nothing and notifies nobody if `id` is not in
    /// the cart. Text input should go through
    /// [`parse_quantity`](crate::normalize::parse_quantity) first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn update_cart_item(&self, id: ProductId, quantity: i64) -> Result<bool, StorageError> {
        self.modify_cart(|items| {
            items.iter_mut().find(|item| item.id == id).is_some_and(|item| {
                item.quantity = clamp_quantity(quantity);
                true
            })
        })
    }

    /// Remove the entry for `id`, keeping the order of the rest.
    ///
    /// Listeners are notified even if nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn remove_from_cart(&self, id: ProductId) -> Result<(), StorageError> {
        self.modify_cart(|items| {
            items.retain(|item| item.id != id);
            true
        })?;
        Ok(())
    }

    /// Empty the cart. The staging snapshot is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn clear_cart(&self) -> Result<(), StorageError> {
        {
            let _guard = self.lock();
            self.write::<LineItem>(CART_KEY, Vec::new())?;
        }
        self.inner.notifier.notify();
        Ok(())
    }

    /// Total number of units in the cart, for the header badge.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.get_cart()
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    // =========================================================================
    // Checkout staging
    // =========================================================================

    /// Replace the checkout staging snapshot.
    ///
    /// Items with quantity zero are stored with quantity one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn set_checkout_items(&self, items: &[CheckoutItem]) -> Result<(), StorageError> {
        let _guard = self.lock();
        self.write(CHECKOUT_KEY, items.to_vec())
    }

    /// Current staging snapshot, or empty if none is staged.
    #[must_use]
    pub fn get_checkout_items(&self) -> Vec<CheckoutItem> {
        self.read(CHECKOUT_KEY)
    }

    /// Erase the staging snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the delete.
    pub fn clear_checkout_items(&self) -> Result<(), StorageError> {
        let _guard = self.lock();
        self.inner.storage.remove(CHECKOUT_KEY)
    }

    /// Read and erase the staging snapshot in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be erased; nothing is
    /// returned in that case so a stale snapshot is never consumed twice.
    pub fn take_checkout_items(&self) -> Result<Vec<CheckoutItem>, StorageError> {
        let _guard = self.lock();
        let items = self.read(CHECKOUT_KEY);
        self.inner.storage.remove(CHECKOUT_KEY)?;
        Ok(items)
    }

    /// Stage one unit of a product for immediate checkout, bypassing the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn stage_buy_now(&self, product: &ProductSnapshot) -> Result<(), StorageError> {
        self.set_checkout_items(&[CheckoutItem::single(product)])
    }

    /// Stage the whole cart for checkout.
    ///
    /// Returns `false` without staging anything if the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend rejects the write.
    pub fn stage_cart_for_checkout(&self) -> Result<bool, StorageError> {
        let _guard = self.lock();
        let staged: Vec<CheckoutItem> = self.get_cart().iter().map(CheckoutItem::from).collect();
        if staged.is_empty() {
            return Ok(false);
        }
        self.write(CHECKOUT_KEY, staged)?;
        Ok(true)
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    /// Register a listener called after every cart change.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.notifier.subscribe(listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.unsubscribe(id)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.inner
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T: StoredItem>(&self, key: &str) -> Vec<T> {
        match self.inner.storage.get(key) {
            Ok(raw) => schema::decode_or_empty(key, raw.as_deref()),
            Err(e) => {
                tracing::warn!(key, error = %e, "Storage read failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Persist `items`, raising any zero quantity to one so the entry always
    /// decodes again.
    fn write<T: StoredItem>(&self, key: &str, mut items: Vec<T>) -> Result<(), StorageError> {
        for item in &mut items {
            if item.quantity() == 0 {
                item.set_quantity(1);
            }
        }
        let encoded = schema::encode(&items)?;
        self.inner.storage.set(key, &encoded)
    }
}

/// Fold entries sharing an id into the first occurrence.
fn merge_duplicates(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(existing) = merged.iter_mut().find(|m| m.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            merged.push(item);
        }
    }
    merged
}
