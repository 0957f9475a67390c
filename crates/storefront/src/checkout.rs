//! Checkout orchestrator.
//!
//! Drives one checkout attempt through its state machine:
//!
//! ```text
//! Idle -> CartLoaded -> Submitting -> OrderCreated -> PaymentPending
//!      -> PaymentConfirmed -> OrderConfirmed (terminal)
//! ```
//!
//! with `Rejected` (terminal) reachable from `Submitting` and
//! `PaymentPending`. Each step suspends at exactly one network
//! round-trip; there are no parallel steps within an attempt.
//!
//! An attempt is single-use. After any terminal state (or a post-payment
//! confirmation failure) a retry starts a fresh attempt from a newly
//! loaded cart. A payment that succeeds without a confirmed order leaves
//! the attempt parked in `PaymentConfirmed`: the created order is an
//! orphaned pending order, surfaced distinctly, never retried
//! automatically.

use copperleaf_core::pricing::{self, PricingPolicy, Quote};
use copperleaf_core::{OrderId, Session, ShippingAddress};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::api::{ApiError, Cart, CheckoutRequest, CommerceClient};
use crate::coupon::{CouponSnapshot, CouponValidator};
use crate::error::{CheckoutError, Result, report};
use crate::payments::{CardDetails, PaymentProcessor};

/// States of one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    CartLoaded,
    Submitting,
    OrderCreated,
    PaymentPending,
    PaymentConfirmed,
    OrderConfirmed,
    Rejected,
}

impl CheckoutState {
    /// Whether the attempt can never be driven further.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::OrderConfirmed | Self::Rejected)
    }
}

/// Outcome of loading the cart into an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    /// Nothing to check out; the caller should leave the flow.
    Empty,
    /// Cart loaded, the attempt may proceed.
    Loaded,
}

/// What a successful attempt hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub order_number: String,
    /// Server-priced total actually charged.
    pub total: Decimal,
}

/// One single-use checkout attempt.
pub struct CheckoutAttempt<P> {
    api: CommerceClient,
    processor: P,
    session: Session,
    policy: PricingPolicy,
    state: CheckoutState,
    cart: Cart,
    coupon: Option<CouponSnapshot>,
}

impl<P: PaymentProcessor> CheckoutAttempt<P> {
    /// Begin an attempt for one signed-in user.
    #[must_use]
    pub fn new(api: CommerceClient, processor: P, session: Session) -> Self {
        Self {
            api,
            processor,
            session,
            policy: PricingPolicy::default(),
            state: CheckoutState::Idle,
            cart: Cart::default(),
            coupon: None,
        }
    }

    /// Current state of the attempt.
    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// The cart projection this attempt is working from.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The currently applied coupon, if any.
    #[must_use]
    pub const fn coupon(&self) -> Option<&CouponSnapshot> {
        self.coupon.as_ref()
    }

    /// Price the current cart and discount.
    ///
    /// Pure recomputation; calling this any number of times changes
    /// nothing.
    #[must_use]
    pub fn quote(&self) -> Quote {
        pricing::quote(
            &self.cart.line_amounts(),
            self.coupon.as_ref().map(CouponSnapshot::discount),
            &self.policy,
        )
    }

    fn transition(&mut self, next: CheckoutState) {
        tracing::debug!(from = ?self.state, to = ?next, "checkout transition");
        self.state = next;
    }

    /// Fetch the cart and arm the attempt.
    ///
    /// An empty cart is a short-circuit, not an error: the caller should
    /// redirect away from checkout.
    ///
    /// # Errors
    ///
    /// Returns `AttemptSpent` when called on an attempt that already
    /// loaded, or an API error if the fetch fails.
    #[instrument(skip(self))]
    pub async fn load_cart(&mut self) -> Result<CartStatus> {
        if self.state != CheckoutState::Idle {
            return Err(CheckoutError::AttemptSpent);
        }

        let cart = self.api.get_cart(&self.session).await?;
        if cart.is_empty() {
            return Ok(CartStatus::Empty);
        }

        self.cart = cart;
        self.transition(CheckoutState::CartLoaded);
        Ok(CartStatus::Loaded)
    }

    /// Refetch the cart projection while the attempt is armed.
    ///
    /// Lets the shopper edit the cart (in another tab, say) between
    /// applying a coupon and submitting. A coupon pinned to the old
    /// subtotal is then refused at submit time until re-validated.
    ///
    /// # Errors
    ///
    /// Returns `AttemptSpent` unless the attempt is in `CartLoaded`, or
    /// an API error if the fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh_cart(&mut self) -> Result<()> {
        if self.state != CheckoutState::CartLoaded {
            return Err(CheckoutError::AttemptSpent);
        }

        self.cart = self.api.get_cart(&self.session).await?;
        Ok(())
    }

    /// Validate and apply a coupon code against the loaded cart.
    ///
    /// A blank code clears any applied discount. The snapshot is pinned
    /// to the current subtotal; if the cart changes afterwards the
    /// snapshot is refused at submit time.
    ///
    /// # Errors
    ///
    /// Returns coupon rejections ([`crate::coupon::CouponError`]) or
    /// `AttemptSpent` if the attempt is past `CartLoaded`.
    #[instrument(skip(self))]
    pub async fn apply_coupon(&mut self, code: &str) -> Result<Option<&CouponSnapshot>> {
        if self.state != CheckoutState::CartLoaded {
            return Err(CheckoutError::AttemptSpent);
        }

        let subtotal = pricing::quote(&self.cart.line_amounts(), None, &self.policy).subtotal;
        let validator = CouponValidator::new(self.api.clone());
        self.coupon = validator.validate(&self.session, code, subtotal).await?;
        Ok(self.coupon.as_ref())
    }

    /// Drive the attempt to completion: create the order, confirm the
    /// payment, confirm the order, clear the cart.
    ///
    /// The shipping address doubles as the billing address. The cart
    /// projection is cleared only after the order is confirmed; every
    /// failure path leaves it intact.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]; the variants map one-to-one onto the
    /// failure exits of the state machine.
    #[instrument(skip(self, address, card))]
    pub async fn place_order(
        &mut self,
        address: &ShippingAddress,
        card: &CardDetails,
    ) -> Result<OrderReceipt> {
        if self.state != CheckoutState::CartLoaded {
            return Err(CheckoutError::AttemptSpent);
        }
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Validation failures recover locally, before any transition.
        address.validate()?;
        let quote = self.quote();
        if let Some(coupon) = &self.coupon
            && coupon.is_stale(quote.subtotal)
        {
            return Err(CheckoutError::StaleCoupon);
        }

        // Suspension point 1: create the pending order.
        self.transition(CheckoutState::Submitting);
        let request = CheckoutRequest {
            shipping_address: address.clone(),
            billing_address: address.clone(),
            coupon_code: self.coupon.as_ref().map(|c| c.code().to_string()),
        };
        let response = match self.api.create_checkout(&self.session, &request).await {
            Ok(response) => response,
            Err(err) => return Err(self.reject_submission(err).await),
        };
        self.transition(CheckoutState::OrderCreated);

        if response.total != quote.total {
            // The server priced against fresher state than we did.
            tracing::warn!(
                local = %quote.total,
                server = %response.total,
                order_id = %response.order_id,
                "Server total disagrees with local quote"
            );
        }

        // Suspension point 2: hand the client secret to the processor.
        // This may require out-of-band user interaction (3-D Secure) and
        // resolves only with a terminal result.
        self.transition(CheckoutState::PaymentPending);
        let confirmation = match self
            .processor
            .confirm_card_payment(&response.client_secret, card)
            .await
        {
            Ok(confirmation) => confirmation,
            Err(err) => {
                self.transition(CheckoutState::Rejected);
                let err = CheckoutError::Payment(err);
                report(&err);
                return Err(err);
            }
        };
        if !confirmation.status.is_succeeded() {
            self.transition(CheckoutState::Rejected);
            let err = CheckoutError::PaymentIncomplete {
                status: confirmation.status,
            };
            report(&err);
            return Err(err);
        }
        self.transition(CheckoutState::PaymentConfirmed);

        // Suspension point 3: mark the order confirmed. Money is already
        // captured; a failure here is the inconsistent-but-recoverable
        // state and must not look like a retry-safe checkout failure.
        let detail = match self.api.confirm_order(&self.session, &response.order_id).await {
            Ok(ack) if ack.is_confirmed() => None,
            Ok(ack) => Some(format!("backend reported status '{}'", ack.status)),
            Err(err) => Some(err.to_string()),
        };
        if let Some(detail) = detail {
            let err = CheckoutError::ConfirmationFailed {
                order_id: response.order_id.clone(),
                order_number: response.order_number.clone(),
                detail,
            };
            report(&err);
            return Err(err);
        }

        self.transition(CheckoutState::OrderConfirmed);
        self.cart = Cart::default();
        self.coupon = None;

        Ok(OrderReceipt {
            order_id: response.order_id,
            order_number: response.order_number,
            total: response.total,
        })
    }

    /// Handle a backend rejection at submit time: the attempt is
    /// terminally rejected, but cart and coupon are kept so the user can
    /// retry with a fresh attempt. The projection is refetched so the
    /// user sees the authoritative state that caused the rejection.
    async fn reject_submission(&mut self, err: ApiError) -> CheckoutError {
        self.transition(CheckoutState::Rejected);

        match self.api.get_cart(&self.session).await {
            Ok(cart) => self.cart = cart,
            Err(refetch_err) => {
                tracing::warn!(error = %refetch_err, "Cart refetch after rejection failed");
            }
        }

        let err = match err {
            ApiError::Backend { detail, .. } => CheckoutError::Rejected { detail },
            other => CheckoutError::Api(other),
        };
        report(&err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::payments::{PaymentConfirmation, PaymentError};
    use async_trait::async_trait;

    struct UnreachableProcessor;

    #[async_trait]
    impl PaymentProcessor for UnreachableProcessor {
        async fn confirm_card_payment(
            &self,
            _client_secret: &str,
            _card: &CardDetails,
        ) -> std::result::Result<PaymentConfirmation, PaymentError> {
            Err(PaymentError::MalformedClientSecret)
        }
    }

    fn attempt() -> CheckoutAttempt<UnreachableProcessor> {
        let config = ApiConfig {
            base_url: url::Url::parse("http://127.0.0.1:1/api").expect("url"),
            request_timeout: std::time::Duration::from_secs(1),
        };
        let api = CommerceClient::new(&config).expect("client");
        CheckoutAttempt::new(api, UnreachableProcessor, Session::new("tok"))
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Test".to_string(),
            address_line1: "1 Test St".to_string(),
            address_line2: None,
            city: "Testville".to_string(),
            state: "TS".to_string(),
            postal_code: "00000".to_string(),
            country: "US".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    fn card() -> CardDetails {
        CardDetails {
            number: "4242424242424242".to_string(),
            exp_month: 12,
            exp_year: 2030,
            cvc: "123".to_string(),
        }
    }

    #[test]
    fn test_new_attempt_starts_idle() {
        let attempt = attempt();
        assert_eq!(attempt.state(), CheckoutState::Idle);
        assert!(attempt.cart().is_empty());
        assert!(attempt.coupon().is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(CheckoutState::OrderConfirmed.is_terminal());
        assert!(CheckoutState::Rejected.is_terminal());
        assert!(!CheckoutState::PaymentConfirmed.is_terminal());
        assert!(!CheckoutState::Idle.is_terminal());
    }

    #[tokio::test]
    async fn test_place_order_requires_loaded_cart() {
        let mut attempt = attempt();
        let err = attempt
            .place_order(&address(), &card())
            .await
            .expect_err("must not run from Idle");
        assert!(matches!(err, CheckoutError::AttemptSpent));
        // No transition happened.
        assert_eq!(attempt.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_refresh_cart_requires_loaded_cart() {
        let mut attempt = attempt();
        let err = attempt
            .refresh_cart()
            .await
            .expect_err("must not run from Idle");
        assert!(matches!(err, CheckoutError::AttemptSpent));
    }

    #[tokio::test]
    async fn test_apply_coupon_requires_loaded_cart() {
        let mut attempt = attempt();
        let err = attempt
            .apply_coupon("SAVE15")
            .await
            .expect_err("must not run from Idle");
        assert!(matches!(err, CheckoutError::AttemptSpent));
    }

    #[test]
    fn test_quote_on_empty_attempt_is_stable() {
        let attempt = attempt();
        assert_eq!(attempt.quote(), attempt.quote());
    }
}
