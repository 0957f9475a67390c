//! Coupon validation.
//!
//! The backend is the sole authority on coupons; the client holds only an
//! immutable [`CouponSnapshot`] for the current checkout attempt. The
//! minimum-order check is re-run here against the **latest** subtotal
//! rather than trusting anything server-cached, so a cart edit after
//! validation cannot leave a stale discount applied.

use copperleaf_core::Session;
use copperleaf_core::pricing::Discount;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiError, CommerceClient, CouponPayload};

/// Rejections from coupon validation.
#[derive(Debug, Error)]
pub enum CouponError {
    /// Unknown code, inactive coupon, or outside the validity window.
    #[error("coupon code is not valid")]
    NotFound,

    /// The coupon's usage limit has been reached.
    #[error("coupon usage limit reached")]
    UsageExceeded,

    /// The current subtotal is below the coupon's minimum order value.
    #[error("order subtotal is below the coupon minimum of {minimum}")]
    BelowMinimum { minimum: Decimal },

    /// Any other backend or transport failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Map a backend rejection onto the coupon error taxonomy.
///
/// Expired coupons come back as 400s but are indistinguishable from
/// unknown codes as far as the shopper is concerned, so both map to
/// `NotFound`.
fn classify_rejection(err: ApiError) -> CouponError {
    match &err {
        ApiError::Backend { status: 404, .. } => CouponError::NotFound,
        ApiError::Backend { status: 400, detail } => {
            if detail.contains("usage limit") {
                CouponError::UsageExceeded
            } else if detail.contains("expired") {
                CouponError::NotFound
            } else {
                CouponError::Api(err)
            }
        }
        _ => CouponError::Api(err),
    }
}

/// A validated coupon, pinned to the subtotal it was validated against.
///
/// Consumed once by the pricing engine. If the cart changes afterwards
/// the snapshot is stale and must be re-validated, never silently reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponSnapshot {
    code: String,
    discount: Discount,
    min_order_value: Decimal,
    validated_subtotal: Decimal,
}

impl CouponSnapshot {
    /// The normalized coupon code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The discount descriptor for the pricing engine.
    #[must_use]
    pub const fn discount(&self) -> &Discount {
        &self.discount
    }

    /// Whether the cart has changed since validation.
    #[must_use]
    pub fn is_stale(&self, current_subtotal: Decimal) -> bool {
        self.validated_subtotal != current_subtotal
    }
}

/// Validates coupon codes against the backend for one checkout attempt.
#[derive(Debug, Clone)]
pub struct CouponValidator {
    client: CommerceClient,
}

impl CouponValidator {
    /// Create a validator over an order backend client.
    #[must_use]
    pub const fn new(client: CommerceClient) -> Self {
        Self { client }
    }

    /// Validate a code against the current subtotal.
    ///
    /// A blank code is a no-op success returning `None`: it clears any
    /// applied discount rather than erroring. Codes are upper-cased
    /// before the lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] for unknown/expired codes, exhausted
    /// usage limits, or a subtotal below the coupon minimum.
    #[instrument(skip(self, session))]
    pub async fn validate(
        &self,
        session: &Session,
        code: &str,
        current_subtotal: Decimal,
    ) -> Result<Option<CouponSnapshot>, CouponError> {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return Ok(None);
        }

        let payload = self
            .client
            .validate_coupon(session, &normalized)
            .await
            .map_err(classify_rejection)?;

        Ok(Some(Self::snapshot(&payload, current_subtotal)?))
    }

    /// Build a snapshot from a validated payload, enforcing the
    /// client-side minimum-order check.
    fn snapshot(
        payload: &CouponPayload,
        current_subtotal: Decimal,
    ) -> Result<CouponSnapshot, CouponError> {
        if current_subtotal < payload.min_order_value {
            return Err(CouponError::BelowMinimum {
                minimum: payload.min_order_value,
            });
        }

        Ok(CouponSnapshot {
            code: payload.code.clone(),
            discount: payload.discount(),
            min_order_value: payload.min_order_value,
            validated_subtotal: current_subtotal,
        })
    }
}
