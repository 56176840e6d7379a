//! Versioned on-disk format for cart and checkout staging entries.
//!
//! Current format:
//!
//! ```json
//! {"version": 1, "items": [{"id": 7, "name": "Mug", "price": "4.5", "image": "", "quantity": 2}]}
//! ```
//!
//! Older clients stored a bare JSON array of items; that form is still
//! accepted on read and rewritten in the current format on the next write.
//! Any other shape decodes to [`SchemaError`], which callers turn into an
//! empty list.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written by [`encode`].
pub const SCHEMA_VERSION: u32 = 1;

/// Reasons a stored value was rejected.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Not JSON, or items did not have the expected fields.
    #[error("Malformed entry: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Envelope carries a version this build does not understand.
    #[error("Unsupported schema version {0}")]
    UnsupportedVersion(u64),

    /// Top-level value was neither an envelope nor an array.
    #[error("Unexpected top-level JSON type")]
    UnexpectedShape,

    /// An item had a quantity below one.
    #[error("Item {index} has quantity 0")]
    ZeroQuantity { index: usize },
}

/// Items that can be persisted through this schema.
pub trait StoredItem: Serialize + DeserializeOwned {
    /// Quantity carried by the item; must be at least one.
    fn quantity(&self) -> u32;

    fn set_quantity(&mut self, quantity: u32);
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    items: &'a [T],
}

#[derive(Deserialize)]
struct Envelope {
    version: u64,
    items: serde_json::Value,
}

/// Encode items in the current envelope.
///
/// # Errors
///
/// Returns an error if an item fails to serialize.
pub fn encode<T: StoredItem>(items: &[T]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        items,
    })
}

/// Decode a stored value in either the current or the legacy format.
///
/// # Errors
///
/// Returns an error on any shape mismatch.
pub fn decode<T: StoredItem>(raw: &str) -> Result<Vec<T>, SchemaError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let items_value = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(_) => {
            let envelope: Envelope = serde_json::from_value(value)?;
            if envelope.version != u64::from(SCHEMA_VERSION) {
                return Err(SchemaError::UnsupportedVersion(envelope.version));
            }
            envelope.items
        }
        _ => return Err(SchemaError::UnexpectedShape),
    };

    let items: Vec<T> = serde_json::from_value(items_value)?;
    if let Some(index) = items.iter().position(|item| item.quantity() == 0) {
        return Err(SchemaError::ZeroQuantity { index });
    }
    Ok(items)
}

/// Decode a value read from storage, treating absence or any error as empty.
pub fn decode_or_empty<T: StoredItem>(key: &str, raw: Option<&str>) -> Vec<T> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    decode(raw).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "Discarding unreadable stored entry");
        Vec::new()
    })
}
