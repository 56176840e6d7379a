//! Normalization of loosely shaped product JSON into cart fields.
//!
//! Product payloads from the storefront API are not uniform: list endpoints
//! nest the price as `{"raw": 19.99, "formatted": "..."}` while detail
//! endpoints send a bare number, and the image may live in any of three
//! places. Every ingestion point (add-to-cart, buy-now, image enrichment)
//! goes through this module so the precedence is defined once:
//!
//! | Field | Precedence |
//! |-------|------------|
//! | id    | `id` as integer or numeric string (required) |
//! | name  | `name`, else `""` |
//! | price | `price.raw`, then `price`, then `0`; numbers or numeric strings |
//! | image | first non-empty of `images.main`, `main_image`, `image`, else `""` |

use bazaar_core::{Price, ProductId};
use serde_json::Value;
use thiserror::Error;

/// A product payload could not be turned into a cart entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The payload has no `id`.
    #[error("Product has no id")]
    MissingId,

    /// The `id` is not an integer.
    #[error("Invalid product id: {0}")]
    InvalidId(String),
}

/// The fields of a product the cart keeps, resolved from remote JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
}

impl ProductSnapshot {
    /// Resolve a snapshot from a product payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload has no usable `id`.
    pub fn from_json(product: &Value) -> Result<Self, NormalizeError> {
        Ok(Self {
            id: resolve_id(product)?,
            name: resolve_name(product),
            price: resolve_price(product),
            image: resolve_image(product),
        })
    }
}

/// Resolve the product id.
///
/// # Errors
///
/// Returns an error if `id` is absent or not an integer.
pub fn resolve_id(product: &Value) -> Result<ProductId, NormalizeError> {
    match product.get("id") {
        None | Some(Value::Null) => Err(NormalizeError::MissingId),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(ProductId::new)
            .ok_or_else(|| NormalizeError::InvalidId(n.to_string())),
        Some(Value::String(s)) => s
            .parse::<ProductId>()
            .map_err(|_| NormalizeError::InvalidId(s.clone())),
        Some(other) => Err(NormalizeError::InvalidId(other.to_string())),
    }
}

/// Resolve the display name.
#[must_use]
pub fn resolve_name(product: &Value) -> String {
    product
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Resolve the price snapshot.
#[must_use]
pub fn resolve_price(product: &Value) -> Price {
    let price = product.get("price");
    let nested = price.and_then(|p| p.get("raw")).filter(|raw| !raw.is_null());
    nested
        .or_else(|| price.filter(|p| !p.is_null()))
        .and_then(price_from_value)
        .unwrap_or(Price::ZERO)
}

fn price_from_value(value: &Value) -> Option<Price> {
    match value {
        Value::Number(n) => Price::from_json_number(n),
        Value::String(s) => Price::parse_lenient(s),
        _ => None,
    }
}

/// Resolve the main image URL, or `""` if the payload has none.
#[must_use]
pub fn resolve_image(product: &Value) -> String {
    let candidates = [
        product.get("images").and_then(|images| images.get("main")),
        product.get("main_image"),
        product.get("image"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|url| !url.trim().is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Coerce a quantity typed by the shopper.
///
/// Non-numeric input becomes 1; numeric input is floored and clamped to at
/// least 1.
#[must_use]
pub fn parse_quantity(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 1.0 => {
            if n >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                // In range and at least 1 after the checks above.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let floored = n.floor() as u32;
                floored
            }
        }
        _ => 1,
    }
}

/// Clamp an integer quantity into the stored range.
#[must_use]
pub fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_list_payload() {
        let product = json!({
            "id": 12,
            "name": "Brass Lamp",
            "price": {"raw": 49.5, "formatted": "$49.50"},
            "images": {"main": "https://cdn.test/lamp.jpg"},
        });
        let snapshot = ProductSnapshot::from_json(&product).unwrap();
        assert_eq!(snapshot.id, ProductId::new(12));
        assert_eq!(snapshot.name, "Brass Lamp");
        assert_eq!(snapshot.price, Price::parse_lenient("49.5").unwrap());
        assert_eq!(snapshot.image, "https://cdn.test/lamp.jpg");
    }

    #[test]
    fn test_price_precedence() {
        assert_eq!(
            resolve_price(&json!({"price": 3})),
            Price::parse_lenient("3").unwrap()
        );
        assert_eq!(
            resolve_price(&json!({"price": "7.25"})),
            Price::parse_lenient("7.25").unwrap()
        );
        assert_eq!(
            resolve_price(&json!({"price": {"raw": null}})),
            Price::ZERO
        );
        assert_eq!(resolve_price(&json!({})), Price::ZERO);
        assert_eq!(resolve_price(&json!({"price": "free"})), Price::ZERO);
    }

    #[test]
    fn test_image_skips_empty_candidates() {
        let product = json!({
            "images": {"main": ""},
            "main_image": "  ",
            "image": "https://cdn.test/fallback.png",
        });
        assert_eq!(resolve_image(&product), "https://cdn.test/fallback.png");
        assert_eq!(resolve_image(&json!({"images": null})), "");
    }

    #[test]
    fn test_id_resolution() {
        assert_eq!(resolve_id(&json!({"id": "15"})), Ok(ProductId::new(15)));
        assert_eq!(resolve_id(&json!({"name": "x"})), Err(NormalizeError::MissingId));
        assert!(matches!(
            resolve_id(&json!({"id": 1.5})),
            Err(NormalizeError::InvalidId(_))
        ));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("abc"), 1);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("0"), 1);
        assert_eq!(parse_quantity("-3"), 1);
        assert_eq!(parse_quantity("2.7"), 2);
        assert_eq!(parse_quantity(" 4 "), 4);
        assert_eq!(parse_quantity("NaN"), 1);
        assert_eq!(parse_quantity("1e20"), u32::MAX);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(-5), 1);
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(9), 9);
        assert_eq!(clamp_quantity(i64::MAX), u32::MAX);
    }
}
