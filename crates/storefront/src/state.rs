//! Shared storefront handle.
//!
//! One `Storefront` is built at startup and cloned wherever needed; it
//! owns the configuration and the long-lived HTTP clients. Per-user
//! credentials are never stored here - every operation takes an explicit
//! [`Session`](copperleaf_core::Session).

use std::sync::Arc;

use copperleaf_core::Session;

use crate::api::{ApiError, CommerceClient};
use crate::cart::CartService;
use crate::checkout::CheckoutAttempt;
use crate::config::StorefrontConfig;
use crate::coupon::CouponValidator;
use crate::payments::StripeGateway;

/// Shared storefront resources.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: CommerceClient,
    gateway: StripeGateway,
}

impl Storefront {
    /// Build the storefront from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = CommerceClient::new(&config.api)?;
        let gateway = StripeGateway::new(&config.payment)?;

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                gateway,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the order backend client.
    #[must_use]
    pub fn api(&self) -> &CommerceClient {
        &self.inner.api
    }

    /// Cart aggregator over the order backend.
    #[must_use]
    pub fn cart(&self) -> CartService {
        CartService::new(self.inner.api.clone())
    }

    /// Coupon validator over the order backend.
    #[must_use]
    pub fn coupons(&self) -> CouponValidator {
        CouponValidator::new(self.inner.api.clone())
    }

    /// Start a fresh single-use checkout attempt for one user.
    #[must_use]
    pub fn begin_checkout(&self, session: Session) -> CheckoutAttempt<StripeGateway> {
        CheckoutAttempt::new(self.inner.api.clone(), self.inner.gateway.clone(), session)
    }
}
