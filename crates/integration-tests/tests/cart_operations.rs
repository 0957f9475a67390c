//! Cart aggregator behavior against the mock order backend.

use copperleaf_core::{Session, VariantId};
use copperleaf_integration_tests::{client_for, mock, session};
use copperleaf_storefront::api::{ApiError, Cart};
use copperleaf_storefront::cart::{CartError, CartService};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

fn line_quantity(cart: &Cart, variant_id: &str) -> Option<u32> {
    cart.items
        .iter()
        .find(|line| line.variant_id.as_str() == variant_id)
        .map(|line| line.quantity)
}

async fn service() -> (mock::TestBackend, CartService) {
    let backend = mock::spawn(mock::BackendState::seeded()).await;
    let service = CartService::new(client_for(&backend));
    (backend, service)
}

#[tokio::test]
async fn test_adding_the_same_variant_merges_quantities() {
    let (_backend, service) = service().await;
    let session = session();
    let mug = VariantId::new("v-mug");

    let cart = service.add_item(&session, &mug, 2).await.expect("add");
    assert_eq!(line_quantity(&cart, "v-mug"), Some(2));
    assert_eq!(
        cart.items.first().map(|line| line.price),
        Some(dec("12.50"))
    );

    let cart = service.add_item(&session, &mug, 3).await.expect("add again");
    assert_eq!(cart.items.len(), 1, "same line, merged");
    assert_eq!(line_quantity(&cart, "v-mug"), Some(5));

    let cart = service
        .add_item(&session, &VariantId::new("v-tee"), 1)
        .await
        .expect("second variant");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_quantity(), 6);
}

#[tokio::test]
async fn test_insufficient_inventory_maps_to_out_of_stock() {
    let (_backend, service) = service().await;
    let session = session();

    // Only one in stock.
    let err = service
        .add_item(&session, &VariantId::new("v-rare"), 2)
        .await
        .expect_err("over inventory");
    assert!(matches!(err, CartError::OutOfStock));

    // Updating past inventory hits the same wall.
    service
        .add_item(&session, &VariantId::new("v-tee"), 1)
        .await
        .expect("add");
    let err = service
        .set_quantity(&session, &VariantId::new("v-tee"), 999)
        .await
        .expect_err("over inventory");
    assert!(matches!(err, CartError::OutOfStock));
}

#[tokio::test]
async fn test_unknown_variant_is_surfaced_with_its_id() {
    let (_backend, service) = service().await;

    let err = service
        .add_item(&session(), &VariantId::new("v-ghost"), 1)
        .await
        .expect_err("unknown variant");
    assert!(matches!(
        err,
        CartError::UnknownVariant(id) if id.as_str() == "v-ghost"
    ));
}

#[tokio::test]
async fn test_set_quantity_updates_the_authoritative_cart() {
    let (_backend, service) = service().await;
    let session = session();
    let tee = VariantId::new("v-tee");

    service.add_item(&session, &tee, 5).await.expect("add");
    let cart = service.set_quantity(&session, &tee, 2).await.expect("update");
    assert_eq!(line_quantity(&cart, "v-tee"), Some(2));
}

#[tokio::test]
async fn test_zero_quantity_is_rejected_without_touching_the_network() {
    let (backend, service) = service().await;
    let session = session();
    let tee = VariantId::new("v-tee");

    service.add_item(&session, &tee, 3).await.expect("add");

    let err = service
        .set_quantity(&session, &tee, 0)
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, CartError::InvalidQuantity(0)));

    // The server never saw the call.
    let state = backend.state.lock().expect("backend state");
    assert_eq!(
        state.cart.first().map(|line| line.quantity),
        Some(3),
        "server line unchanged"
    );
}

#[tokio::test]
async fn test_updating_a_line_that_is_not_in_the_cart_is_a_backend_rejection() {
    let (_backend, service) = service().await;

    let err = service
        .set_quantity(&session(), &VariantId::new("v-mug"), 2)
        .await
        .expect_err("line absent");
    assert!(matches!(
        err,
        CartError::Api(ApiError::Backend { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let (_backend, service) = service().await;
    let session = session();
    let mug = VariantId::new("v-mug");

    service.add_item(&session, &mug, 1).await.expect("add");
    let cart = service.remove_item(&session, &mug).await.expect("remove");
    assert!(cart.is_empty());

    // Removing an absent line is acknowledged, not an error.
    let cart = service
        .remove_item(&session, &mug)
        .await
        .expect("remove again");
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_every_mutation_returns_the_full_refetched_cart() {
    let (backend, service) = service().await;
    let session = session();

    let cart = service
        .add_item(&session, &VariantId::new("v-hoodie"), 1)
        .await
        .expect("add");

    // The projection matches the authoritative store exactly.
    let state = backend.state.lock().expect("backend state");
    assert_eq!(cart.items, state.cart);
    let line = cart.items.first().expect("one line");
    assert_eq!(line.price, dec("60.00"));
    assert_eq!(
        line.product.as_ref().map(|p| p.title.as_str()),
        Some("Fleece Hoodie")
    );
    assert_eq!(
        line.variant.as_ref().map(|v| v.sku.as_str()),
        Some("SKU-HOODIE")
    );
}

#[tokio::test]
async fn test_a_rejected_session_is_a_backend_error() {
    let (_backend, service) = service().await;

    let err = service
        .fetch(&Session::new(""))
        .await
        .expect_err("no credential");
    assert!(matches!(
        err,
        CartError::Api(ApiError::Backend { status: 401, .. })
    ));
}
