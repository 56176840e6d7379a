//! Bazaar Storefront client library.
//!
//! Holds the shopper-side state of the storefront and the calls it makes to
//! the backend:
//!
//! - [`cart`] - Persistent cart and checkout staging store with change notification
//! - [`storage`] - Key-value backends the store persists through (memory, files)
//! - [`schema`] - Versioned on-disk format of stored entries
//! - [`normalize`] - Field precedence for loosely shaped product JSON
//! - [`enrich`] - Backfill of missing cart images from the catalog
//! - [`checkout`] - Order form validation and submission
//! - [`orders`] - Order history with per-order details
//! - [`api`] - REST client for products and orders
//! - [`report`] - Error reports forwarded to the log sidecar
//! - [`config`] - Environment configuration
//!
//! Prices, stock and order state belong to the backend; nothing here computes
//! totals or validates availability.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod enrich;
pub mod normalize;
pub mod orders;
pub mod report;
pub mod schema;
pub mod storage;

pub use cart::{CartStore, CheckoutItem, LineItem};
pub use config::ClientConfig;
