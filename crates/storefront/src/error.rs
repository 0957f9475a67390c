//! Unified checkout error taxonomy with Sentry integration.
//!
//! Every failure the checkout flow can surface is one of these variants,
//! classified by [`Severity`]. The post-payment confirmation failure is
//! deliberately its own variant and its own severity: money has been
//! captured but the order is not confirmed, and a blind retry could
//! double-charge, so it must never be presented as a generic error.

use copperleaf_core::{AddressError, OrderId, PaymentIntentStatus};
use thiserror::Error;

use crate::api::ApiError;
use crate::coupon::CouponError;
use crate::payments::PaymentError;

/// How bad a checkout failure is, and therefore how it is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Bad input, corrected locally. No state transition happened.
    Validation,
    /// The authoritative store disagreed (inventory, coupon usage). The
    /// cart is refetched and the user may retry.
    Consistency,
    /// The processor rejected the payment. The order stays unpaid
    /// server-side; retrying starts a fresh attempt.
    Payment,
    /// Network or backend failure before any payment was captured.
    /// Retry-safe, presented generically.
    Transient,
    /// Money captured, order not confirmed. Surfaced distinctly and
    /// captured to error tracking; never retried blindly.
    Critical,
}

/// Errors surfaced by the checkout orchestrator.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required address field is missing.
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    /// Checkout requires a non-empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Coupon validation failed.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// The cart changed after the coupon was validated; the stale
    /// snapshot is refused rather than silently reused.
    #[error("cart changed since the coupon was applied; re-validate the code")]
    StaleCoupon,

    /// The attempt was already driven; retry starts a new attempt.
    #[error("checkout attempt already used; start a new attempt")]
    AttemptSpent,

    /// The backend rejected order creation (inventory changed, coupon
    /// invalid at submit time, ...). Detail is the backend's message.
    #[error("order was rejected: {detail}")]
    Rejected { detail: String },

    /// The processor rejected the payment.
    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    /// The processor finished without reaching `succeeded`.
    #[error("payment did not complete (processor status: {status:?})")]
    PaymentIncomplete { status: PaymentIntentStatus },

    /// Payment succeeded but the order could not be marked confirmed.
    #[error(
        "payment succeeded but order confirmation failed for order {order_number}; \
         contact support with order id {order_id} ({detail})"
    )]
    ConfirmationFailed {
        order_id: OrderId,
        order_number: String,
        detail: String,
    },

    /// Backend or transport failure before payment.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckoutError {
    /// Classify this failure.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Address(_)
            | Self::EmptyCart
            | Self::Coupon(_)
            | Self::StaleCoupon
            | Self::AttemptSpent => Severity::Validation,
            Self::Rejected { .. } => Severity::Consistency,
            Self::Payment(_) | Self::PaymentIncomplete { .. } => Severity::Payment,
            Self::ConfirmationFailed { .. } => Severity::Critical,
            Self::Api(_) => Severity::Transient,
        }
    }

    /// The message shown to the user.
    ///
    /// Backend and processor messages propagate verbatim; unexpected
    /// failures get a generic retry-safe message only because no payment
    /// has been captured on that path.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(_) => "Checkout failed, please try again".to_string(),
            other => other.to_string(),
        }
    }
}

/// Report a checkout failure.
///
/// Critical failures (captured payment without a confirmed order) go to
/// Sentry with the event id logged so support can correlate; everything
/// else is logged at a level matching its severity.
pub fn report(err: &CheckoutError) {
    match err.severity() {
        Severity::Critical => {
            let event_id = sentry::capture_error(err);
            tracing::error!(
                error = %err,
                sentry_event_id = %event_id,
                "Payment captured but order not confirmed"
            );
        }
        Severity::Transient => {
            tracing::error!(error = %err, "Checkout failed unexpectedly");
        }
        Severity::Payment | Severity::Consistency => {
            tracing::warn!(error = %err, "Checkout attempt rejected");
        }
        Severity::Validation => {
            tracing::debug!(error = %err, "Checkout input rejected");
        }
    }
}

/// Result type alias for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
