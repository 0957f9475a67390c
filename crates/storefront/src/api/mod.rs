//! Order backend REST client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local sync, direct API calls
//! - Every operation takes an explicit [`Session`] credential; nothing is
//!   read from ambient storage
//! - Backend failures carry a `{"detail": "..."}` body which is
//!   propagated verbatim in [`ApiError::Backend`]
//!
//! # Example
//!
//! ```rust,ignore
//! use copperleaf_storefront::api::CommerceClient;
//!
//! let client = CommerceClient::new(&config.api)?;
//! let cart = client.get_cart(&session).await?;
//! client.update_cart_item(&session, &variant_id, 2).await?;
//! ```

pub mod types;

pub use types::*;

use copperleaf_core::{OrderId, Session, VariantId};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the order backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the request with an error body.
    #[error("backend rejected request ({status}): {detail}")]
    Backend { status: u16, detail: String },
}

impl ApiError {
    /// The backend's HTTP status, if this is a backend rejection.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend's error detail, if this is a backend rejection.
    #[must_use]
    pub fn backend_detail(&self) -> Option<&str> {
        match self {
            Self::Backend { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// Whether the backend answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

/// Client for the order backend REST API.
///
/// Cheap to clone; the underlying `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct CommerceClient {
    client: reqwest::Client,
    base_url: String,
}

impl CommerceClient {
    /// Create a new order backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and decode the JSON response.
    ///
    /// Reads the body as text first so failures can be logged with the
    /// raw payload, the way rejections actually arrive.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        session: &Session,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let mut request = self
            .client
            .request(method, self.endpoint(path))
            .header(reqwest::header::AUTHORIZATION, session.bearer());

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&response_text)
                .map_or_else(
                    |_| response_text.chars().take(200).collect::<String>(),
                    |body| body.detail,
                );
            tracing::debug!(
                status = %status,
                detail = %detail,
                path = %path,
                "Backend rejected request"
            );
            return Err(ApiError::Backend {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                path = %path,
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the authoritative cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self, session))]
    pub async fn get_cart(&self, session: &Session) -> Result<Cart, ApiError> {
        self.execute(Method::GET, "/cart", session, None).await
    }

    /// Add a variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns a backend rejection if the variant is unknown or the
    /// requested quantity exceeds available inventory.
    #[instrument(skip(self, session))]
    pub async fn add_cart_item(
        &self,
        session: &Session,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "variant_id": variant_id,
            "quantity": quantity,
        });
        let _: Ack = self
            .execute(Method::POST, "/cart/items", session, Some(body))
            .await?;
        Ok(())
    }

    /// Set a cart line's quantity.
    ///
    /// # Errors
    ///
    /// Returns a backend rejection if the line does not exist or the
    /// quantity exceeds available inventory.
    #[instrument(skip(self, session))]
    pub async fn update_cart_item(
        &self,
        session: &Session,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let path = format!("/cart/items/{variant_id}?quantity={quantity}");
        let _: Ack = self.execute(Method::PUT, &path, session, None).await?;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport or session failures; removing
    /// an absent line is acknowledged by the backend.
    #[instrument(skip(self, session))]
    pub async fn remove_cart_item(
        &self,
        session: &Session,
        variant_id: &VariantId,
    ) -> Result<(), ApiError> {
        let path = format!("/cart/items/{variant_id}");
        let _: Ack = self.execute(Method::DELETE, &path, session, None).await?;
        Ok(())
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Ask the backend to validate a coupon code.
    ///
    /// # Errors
    ///
    /// Returns a backend rejection for unknown, expired, or exhausted
    /// codes. Callers should go through the coupon validator, which maps
    /// these into the coupon error taxonomy.
    #[instrument(skip(self, session))]
    pub async fn validate_coupon(
        &self,
        session: &Session,
        code: &str,
    ) -> Result<CouponPayload, ApiError> {
        let path = format!("/coupons/validate/{code}");
        self.execute(Method::GET, &path, session, None).await
    }

    // =========================================================================
    // Checkout & Orders
    // =========================================================================

    /// Create a pending order and obtain a payment client secret.
    ///
    /// # Errors
    ///
    /// Returns a backend rejection if the cart is empty, inventory
    /// changed, or the coupon is invalid at submit time.
    #[instrument(skip(self, session, request))]
    pub async fn create_checkout(
        &self,
        session: &Session,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, ApiError> {
        let body = serde_json::to_value(request)?;
        self.execute(Method::POST, "/checkout", session, Some(body))
            .await
    }

    /// Mark an order confirmed after the processor reports success.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot verify the payment. A
    /// failure here after a captured payment is the highest-severity
    /// checkout failure; see the checkout orchestrator.
    #[instrument(skip(self, session))]
    pub async fn confirm_order(
        &self,
        session: &Session,
        order_id: &OrderId,
    ) -> Result<ConfirmOrderResponse, ApiError> {
        let path = format!("/orders/{order_id}/confirm");
        self.execute(Method::POST, &path, session, None).await
    }

    /// List the user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self, session))]
    pub async fn list_orders(
        &self,
        session: &Session,
        skip: u32,
        limit: u32,
    ) -> Result<OrdersPage, ApiError> {
        let path = format!("/orders?skip={skip}&limit={limit}");
        self.execute(Method::GET, &path, session, None).await
    }

    /// Fetch one order projection.
    ///
    /// # Errors
    ///
    /// Returns a 404 backend rejection for orders that do not exist or
    /// belong to another user.
    #[instrument(skip(self, session))]
    pub async fn get_order(&self, session: &Session, order_id: &OrderId) -> Result<Order, ApiError> {
        let path = format!("/orders/{order_id}");
        self.execute(Method::GET, &path, session, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Backend {
            status: 400,
            detail: "Insufficient inventory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "backend rejected request (400): Insufficient inventory"
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.backend_detail(), Some("Insufficient inventory"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_detection() {
        let err = ApiError::Backend {
            status: 404,
            detail: "Invalid coupon".to_string(),
        };
        assert!(err.is_not_found());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ApiConfig {
            base_url: url::Url::parse("http://localhost:8000/api/").expect("url"),
            request_timeout: std::time::Duration::from_secs(5),
        };
        let client = CommerceClient::new(&config).expect("client");
        assert_eq!(client.endpoint("/cart"), "http://localhost:8000/api/cart");
    }
}
