//! Price snapshot captured when a product enters the cart.
//!
//! Prices are owned by the backend. The client only remembers the value it
//! saw at add-time so the cart can be rendered offline; it never recomputes
//! or re-validates it.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A decimal price snapshot.
///
/// Serializes as a decimal string (`"19.99"`) and deserializes from either a
/// string or a JSON number, so carts written by older clients still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A zero price, used when a product carries no usable price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse a price from loose textual input such as `"19.99"` or `" 5 "`.
    ///
    /// Returns `None` for anything that is not a finite decimal.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        Decimal::from_str(raw.trim()).ok().map(Self)
    }

    /// Convert a JSON number into a price.
    #[must_use]
    pub fn from_json_number(number: &serde_json::Number) -> Option<Self> {
        if let Some(i) = number.as_i64() {
            return Some(Self(Decimal::from(i)));
        }
        if let Some(u) = number.as_u64() {
            return Some(Self(Decimal::from(u)));
        }
        // Going through the textual form keeps `19.99` exact instead of
        // inheriting binary float noise.
        Self::parse_lenient(&number.to_string())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.normalize().to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Self::parse_lenient(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid price: {s}"))),
            serde_json::Value::Number(n) => Self::from_json_number(&n)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid price: {n}"))),
            other => Err(serde::de::Error::custom(format!(
                "price must be a string or number, got {other}"
            ))),
        }
    }
}
