//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// Order lifecycle status, as reported by the order backend.
///
/// The client only ever reads these; the backend is the sole authority
/// on transitions. An order must never reach `Confirmed` without the
/// payment processor reporting `succeeded` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

/// Payment status on an order, as reported by the order backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

/// Terminal and intermediate statuses reported by the payment processor
/// for one payment attempt.
///
/// Anything other than `Succeeded` leaves the checkout attempt rejected;
/// unrecognized statuses map to `Unknown` rather than failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Succeeded,
    Processing,
    RequiresAction,
    RequiresConfirmation,
    RequiresPaymentMethod,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PaymentIntentStatus {
    /// Whether this status means the money has been captured.
    #[must_use]
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::Confirmed).expect("serialize");
        assert_eq!(json, "\"confirmed\"");
    }

    #[test]
    fn test_intent_status_wire_format() {
        let status: PaymentIntentStatus =
            serde_json::from_str("\"requires_action\"").expect("deserialize");
        assert_eq!(status, PaymentIntentStatus::RequiresAction);
        assert!(!status.is_succeeded());
    }

    #[test]
    fn test_intent_status_unknown_is_tolerated() {
        let status: PaymentIntentStatus =
            serde_json::from_str("\"some_future_status\"").expect("deserialize");
        assert_eq!(status, PaymentIntentStatus::Unknown);
    }
}
