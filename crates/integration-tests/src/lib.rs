//! End-to-end checkout tests for Copperleaf.
//!
//! The real `CommerceClient`, cart aggregator, coupon validator, and
//! checkout orchestrator are driven against an in-process mock of the
//! order backend ([`mock`]) and a scripted payment processor
//! ([`processor`]). Nothing is stubbed inside the storefront crate
//! itself; every network suspension point is exercised over real HTTP.
//!
//! Run with: `cargo test -p copperleaf-integration-tests`

pub mod mock;
pub mod processor;

use copperleaf_core::{Session, ShippingAddress};
use copperleaf_storefront::api::CommerceClient;
use copperleaf_storefront::config::ApiConfig;
use copperleaf_storefront::payments::CardDetails;

/// A valid test session. The mock backend accepts any bearer token.
#[must_use]
pub fn session() -> Session {
    Session::new("test-bearer-token")
}

/// A complete, valid shipping address.
#[must_use]
pub fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Robin Buyer".to_string(),
        address_line1: "42 Market Street".to_string(),
        address_line2: None,
        city: "Springfield".to_string(),
        state: "OR".to_string(),
        postal_code: "97477".to_string(),
        country: "US".to_string(),
        phone: "555-0134".to_string(),
    }
}

/// A test card.
#[must_use]
pub fn card() -> CardDetails {
    CardDetails {
        number: "4242424242424242".to_string(),
        exp_month: 12,
        exp_year: 2030,
        cvc: "123".to_string(),
    }
}

/// Build a real backend client pointed at a spawned mock backend.
///
/// # Panics
///
/// Panics if the client cannot be built (test setup failure).
#[must_use]
pub fn client_for(backend: &mock::TestBackend) -> CommerceClient {
    let config = ApiConfig {
        base_url: url::Url::parse(&backend.base_url).expect("mock backend URL"),
        request_timeout: std::time::Duration::from_secs(5),
    };
    CommerceClient::new(&config).expect("build CommerceClient")
}
