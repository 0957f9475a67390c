//! Copperleaf Storefront - checkout client library.
//!
//! The storefront is mostly a thin view over the order backend; this
//! crate holds the one subsystem with real design pressure: turning a
//! mutable cart into a priced, payment-confirmed order while three
//! independent parties - this client, the order backend, and the payment
//! processor - can each fail or time out on their own.
//!
//! # Architecture
//!
//! - [`api`] - REST client for the order backend; every call takes an
//!   explicit session credential
//! - [`cart`] - cart aggregator; the backend stays authoritative, every
//!   mutation is followed by a full refetch
//! - [`coupon`] - coupon validation with client-side minimum-order and
//!   staleness checks
//! - [`payments`] - payment processor contract and the Stripe gateway
//! - [`checkout`] - the single-use checkout attempt state machine
//! - [`error`] - unified failure taxonomy; the post-payment confirmation
//!   failure is its own severity class
//!
//! # Example
//!
//! ```rust,ignore
//! use copperleaf_core::Session;
//! use copperleaf_storefront::{Storefront, StorefrontConfig};
//! use copperleaf_storefront::checkout::CartStatus;
//!
//! let storefront = Storefront::new(StorefrontConfig::from_env()?)?;
//! let session = Session::new(bearer_token);
//!
//! let mut attempt = storefront.begin_checkout(session);
//! if attempt.load_cart().await? == CartStatus::Empty {
//!     return Ok(()); // nothing to check out
//! }
//! attempt.apply_coupon("SAVE15").await?;
//! let receipt = attempt.place_order(&address, &card).await?;
//! println!("confirmed {}", receipt.order_number);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod coupon;
pub mod error;
pub mod payments;
pub mod state;
pub mod telemetry;

pub use config::{ApiConfig, ConfigError, PaymentConfig, StorefrontConfig};
pub use error::{CheckoutError, Severity};
pub use state::Storefront;
