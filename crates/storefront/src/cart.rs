//! Cart aggregator.
//!
//! The backend holds the authoritative cart; this service round-trips
//! every mutation and then refetches the whole cart, trading a little
//! latency for a projection that always matches the authoritative store.
//! There is no optimistic diffing.

use copperleaf_core::{Session, VariantId};
use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiError, Cart, CommerceClient};

/// Errors surfaced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity exceeds available inventory right now. Another
    /// buyer may still win the race before checkout; the backend remains
    /// authoritative and can reject again at submit time.
    #[error("not enough inventory to fulfil the requested quantity")]
    OutOfStock,

    /// The variant does not exist (or is no longer purchasable).
    #[error("unknown variant: {0}")]
    UnknownVariant(VariantId),

    /// Quantities below 1 never reach the backend; removal deletes the
    /// line instead.
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(u32),

    /// Any other backend or transport failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Classify a backend rejection from a cart mutation.
fn classify_rejection(err: ApiError, variant_id: &VariantId) -> CartError {
    match &err {
        ApiError::Backend { status: 400, detail } if detail.contains("inventory") => {
            CartError::OutOfStock
        }
        ApiError::Backend { status: 404, detail } if detail.contains("Variant") => {
            CartError::UnknownVariant(variant_id.clone())
        }
        _ => CartError::Api(err),
    }
}

/// Client-side handle on the server-held cart.
#[derive(Debug, Clone)]
pub struct CartService {
    client: CommerceClient,
}

impl CartService {
    /// Create a cart service over an order backend client.
    #[must_use]
    pub const fn new(client: CommerceClient) -> Self {
        Self { client }
    }

    /// Fetch the current authoritative cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn fetch(&self, session: &Session) -> Result<Cart, CartError> {
        Ok(self.client.get_cart(session).await?)
    }

    /// Add a variant to the cart, then refetch.
    ///
    /// # Errors
    ///
    /// Returns `OutOfStock` when the requested quantity exceeds available
    /// inventory at the time of the call.
    #[instrument(skip(self, session))]
    pub async fn add_item(
        &self,
        session: &Session,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        self.client
            .add_cart_item(session, variant_id, quantity)
            .await
            .map_err(|e| classify_rejection(e, variant_id))?;
        self.fetch(session).await
    }

    /// Set a line's quantity, then refetch.
    ///
    /// Quantity is unbounded client-side; the backend bounds it by
    /// inventory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for quantities below 1 without touching
    /// the network.
    #[instrument(skip(self, session))]
    pub async fn set_quantity(
        &self,
        session: &Session,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        self.client
            .update_cart_item(session, variant_id, quantity)
            .await
            .map_err(|e| classify_rejection(e, variant_id))?;
        self.fetch(session).await
    }

    /// Remove a line, then refetch. Idempotent: removing an absent line
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport or session failures.
    #[instrument(skip(self, session))]
    pub async fn remove_item(
        &self,
        session: &Session,
        variant_id: &VariantId,
    ) -> Result<Cart, CartError> {
        match self.client.remove_cart_item(session, variant_id).await {
            Ok(()) => {}
            // No cart yet means nothing to remove; keep the operation
            // idempotent rather than surfacing a 404.
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(CartError::Api(err)),
        }
        self.fetch(session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant() -> VariantId {
        VariantId::new("var-1")
    }

    #[test]
    fn test_inventory_rejection_maps_to_out_of_stock() {
        let err = ApiError::Backend {
            status: 400,
            detail: "Insufficient inventory".to_string(),
        };
        assert!(matches!(
            classify_rejection(err, &variant()),
            CartError::OutOfStock
        ));
    }

    #[test]
    fn test_unknown_variant_mapping() {
        let err = ApiError::Backend {
            status: 404,
            detail: "Variant not found".to_string(),
        };
        assert!(matches!(
            classify_rejection(err, &variant()),
            CartError::UnknownVariant(id) if id.as_str() == "var-1"
        ));
    }

    #[test]
    fn test_other_rejections_pass_through() {
        let err = ApiError::Backend {
            status: 401,
            detail: "Invalid token".to_string(),
        };
        assert!(matches!(
            classify_rejection(err, &variant()),
            CartError::Api(ApiError::Backend { status: 401, .. })
        ));
    }
}
