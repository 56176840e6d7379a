//! Status and choice enums exchanged with the storefront API.

use serde::{Deserialize, Serialize};

/// Order status a shopper may request for one of their orders.
///
/// The backend owns the order state machine and decides whether a request is
/// allowed; these are only the values the client is able to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusRequest {
    /// Cancel an order that has not shipped.
    Cancelled,
    /// Ask for a delivered order to be returned.
    ReturnRequested,
    /// Ask for a refund.
    Refunded,
    /// Withdraw a pending refund request.
    RefundCancelled,
}

impl std::fmt::Display for OrderStatusRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::ReturnRequested => write!(f, "return_requested"),
            Self::Refunded => write!(f, "refunded"),
            Self::RefundCancelled => write!(f, "refund_cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatusRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancelled" => Ok(Self::Cancelled),
            "return_requested" => Ok(Self::ReturnRequested),
            "refunded" => Ok(Self::Refunded),
            "refund_cancelled" => Ok(Self::RefundCancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// Card payment collected by the backend.
    Card,
    /// UPI transfer collected by the backend.
    Upi,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "cod"),
            Self::Card => write!(f, "card"),
            Self::Upi => write!(f, "upi"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names_match_display() {
        for status in [
            OrderStatusRequest::Cancelled,
            OrderStatusRequest::ReturnRequested,
            OrderStatusRequest::Refunded,
            OrderStatusRequest::RefundCancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            assert_eq!(status.to_string().parse::<OrderStatusRequest>().unwrap(), status);
        }
    }

    #[test]
    fn test_payment_method_default_is_cod() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cod);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
