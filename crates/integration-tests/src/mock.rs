//! In-process mock of the order backend.
//!
//! Serves the same REST contract the production backend does, down to the
//! `{"detail": "..."}` error bodies, so the storefront clients can be
//! exercised unmodified. Tests script failures through the shared
//! [`BackendState`] handle (checkout rejections, confirm failures) and
//! inspect it afterwards (order status, whether the cart survived).
//!
//! The backend clears the cart when an order is *confirmed*, not when it
//! is created: a rejected payment must leave the cart intact.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use copperleaf_core::pricing::DiscountKind;
use copperleaf_core::{OrderStatus, PaymentStatus, ProductId, VariantId};
use copperleaf_storefront::api::{
    AddItemRequest, Cart, CartLine, CheckoutRequest, CouponPayload, Order, OrderLine,
    ProductSummary, VariantSummary,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

/// One purchasable variant with live inventory.
#[derive(Debug, Clone)]
pub struct VariantStock {
    pub product_id: String,
    pub title: String,
    pub sku: String,
    pub price: Decimal,
    pub inventory: u32,
}

/// Scriptable backend state shared between the server and the test.
#[derive(Debug, Default)]
pub struct BackendState {
    pub variants: HashMap<String, VariantStock>,
    pub cart: Vec<CartLine>,
    pub coupons: HashMap<String, CouponPayload>,
    pub orders: HashMap<String, Order>,
    /// When set, `POST /checkout` rejects with this detail.
    pub reject_checkout: Option<String>,
    /// When true, `POST /orders/{id}/confirm` fails with a 500.
    pub fail_confirm: bool,
    pub checkout_calls: u32,
    pub confirm_calls: u32,
}

impl BackendState {
    /// A catalog and coupon book large enough for every test scenario.
    #[must_use]
    pub fn seeded() -> Self {
        let mut variants = HashMap::new();
        for (id, product_id, title, sku, price_cents, inventory) in [
            ("v-hoodie", "p-hoodie", "Fleece Hoodie", "SKU-HOODIE", 6000, 10),
            ("v-tee", "p-tee", "Logo Tee", "SKU-TEE", 2500, 50),
            ("v-desk", "p-desk", "Standing Desk", "SKU-DESK", 20000, 3),
            ("v-mug", "p-mug", "Camp Mug", "SKU-MUG", 1250, 100),
            ("v-rare", "p-rare", "Limited Print", "SKU-RARE", 9900, 1),
        ] {
            variants.insert(
                id.to_string(),
                VariantStock {
                    product_id: product_id.to_string(),
                    title: title.to_string(),
                    sku: sku.to_string(),
                    price: Decimal::new(price_cents, 2),
                    inventory,
                },
            );
        }

        let mut coupons = HashMap::new();
        coupons.insert(
            "SAVE15".to_string(),
            coupon("SAVE15", DiscountKind::Percentage, 15, Some(20), 0, None, 0),
        );
        coupons.insert(
            "FLAT20".to_string(),
            coupon("FLAT20", DiscountKind::Flat, 20, None, 0, None, 0),
        );
        coupons.insert(
            "BIGSPEND".to_string(),
            coupon("BIGSPEND", DiscountKind::Flat, 5, None, 100, None, 0),
        );
        let mut expired = coupon("EXPIRED", DiscountKind::Flat, 5, None, 0, None, 0);
        expired.valid_to = Utc::now() - Duration::days(1);
        coupons.insert("EXPIRED".to_string(), expired);
        coupons.insert(
            "LIMITED".to_string(),
            coupon("LIMITED", DiscountKind::Flat, 5, None, 0, Some(5), 5),
        );

        Self {
            variants,
            coupons,
            ..Self::default()
        }
    }

    /// Put lines straight into the server-held cart.
    ///
    /// # Panics
    ///
    /// Panics if a variant id is not in the seeded catalog.
    pub fn seed_cart(&mut self, lines: &[(&str, u32)]) {
        for (variant_id, quantity) in lines {
            let stock = self
                .variants
                .get(*variant_id)
                .expect("seed_cart: unknown variant");
            self.cart.push(CartLine {
                variant_id: VariantId::new(*variant_id),
                quantity: *quantity,
                price: stock.price,
                product: Some(ProductSummary {
                    id: ProductId::new(stock.product_id.clone()),
                    title: stock.title.clone(),
                }),
                variant: Some(VariantSummary {
                    id: VariantId::new(*variant_id),
                    sku: stock.sku.clone(),
                }),
            });
        }
    }
}

fn coupon(
    code: &str,
    kind: DiscountKind,
    value: i64,
    max_discount: Option<i64>,
    min_order_value: i64,
    usage_limit: Option<u32>,
    usage_count: u32,
) -> CouponPayload {
    CouponPayload {
        code: code.to_string(),
        kind,
        value: Decimal::new(value, 0),
        min_order_value: Decimal::new(min_order_value, 0),
        max_discount: max_discount.map(|v| Decimal::new(v, 0)),
        usage_limit,
        usage_count,
        valid_from: Utc::now() - Duration::days(30),
        valid_to: Utc::now() + Duration::days(365),
        is_active: true,
    }
}

type Shared = Arc<Mutex<BackendState>>;

/// A spawned mock backend.
pub struct TestBackend {
    pub state: Shared,
    /// Base URL including the `/api` prefix, for `ApiConfig`.
    pub base_url: String,
}

/// Spawn the mock backend on an ephemeral port.
///
/// # Panics
///
/// Panics if the listener cannot be bound (test setup failure).
pub async fn spawn(state: BackendState) -> TestBackend {
    let shared = Arc::new(Mutex::new(state));
    let app = router(Arc::clone(&shared));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });

    TestBackend {
        state: shared,
        base_url: format!("http://{addr}/api"),
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/items", post(add_cart_item))
        .route(
            "/api/cart/items/{variant_id}",
            put(update_cart_item).delete(remove_cart_item),
        )
        .route("/api/coupons/validate/{code}", get(validate_coupon))
        .route("/api/checkout", post(checkout))
        .route("/api/orders", get(list_orders))
        .route("/api/orders/{order_id}", get(get_order))
        .route("/api/orders/{order_id}/confirm", post(confirm_order))
        .with_state(state)
}

fn reject(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn unauthorized(headers: &HeaderMap) -> Option<Response> {
    let ok = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len());
    if ok {
        None
    } else {
        Some(reject(StatusCode::UNAUTHORIZED, "Not authenticated"))
    }
}

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, BackendState> {
    state.lock().expect("backend state poisoned")
}

// =============================================================================
// Cart
// =============================================================================

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let state = lock(&state);
    Json(Cart {
        items: state.cart.clone(),
    })
    .into_response()
}

async fn add_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(request): Json<AddItemRequest>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let mut state = lock(&state);

    let Some(stock) = state.variants.get(request.variant_id.as_str()).cloned() else {
        return reject(StatusCode::NOT_FOUND, "Variant not found");
    };
    if stock.inventory < request.quantity {
        return reject(StatusCode::BAD_REQUEST, "Insufficient inventory");
    }

    if let Some(line) = state
        .cart
        .iter_mut()
        .find(|line| line.variant_id == request.variant_id)
    {
        line.quantity += request.quantity;
    } else {
        state.cart.push(CartLine {
            variant_id: request.variant_id.clone(),
            quantity: request.quantity,
            price: stock.price,
            product: Some(ProductSummary {
                id: ProductId::new(stock.product_id.clone()),
                title: stock.title.clone(),
            }),
            variant: Some(VariantSummary {
                id: request.variant_id,
                sku: stock.sku,
            }),
        });
    }

    Json(json!({ "message": "Item added to cart" })).into_response()
}

#[derive(Debug, Deserialize)]
struct QuantityParam {
    quantity: u32,
}

async fn update_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(variant_id): Path<String>,
    Query(params): Query<QuantityParam>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let mut state = lock(&state);

    if !state
        .cart
        .iter()
        .any(|line| line.variant_id.as_str() == variant_id)
    {
        return reject(StatusCode::NOT_FOUND, "Item not in cart");
    }

    if params.quantity == 0 {
        state
            .cart
            .retain(|line| line.variant_id.as_str() != variant_id);
        return Json(json!({ "message": "Cart updated" })).into_response();
    }

    let available = state
        .variants
        .get(&variant_id)
        .map_or(0, |stock| stock.inventory);
    if available < params.quantity {
        return reject(StatusCode::BAD_REQUEST, "Insufficient inventory");
    }

    if let Some(line) = state
        .cart
        .iter_mut()
        .find(|line| line.variant_id.as_str() == variant_id)
    {
        line.quantity = params.quantity;
    }

    Json(json!({ "message": "Cart updated" })).into_response()
}

async fn remove_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(variant_id): Path<String>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let mut state = lock(&state);
    state
        .cart
        .retain(|line| line.variant_id.as_str() != variant_id);
    Json(json!({ "message": "Item removed from cart" })).into_response()
}

// =============================================================================
// Coupons
// =============================================================================

async fn validate_coupon(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let state = lock(&state);

    let Some(coupon) = state.coupons.get(&code) else {
        return reject(StatusCode::NOT_FOUND, "Invalid coupon");
    };
    if !coupon.is_active {
        return reject(StatusCode::NOT_FOUND, "Invalid coupon");
    }

    let now = Utc::now();
    if now < coupon.valid_from || now > coupon.valid_to {
        return reject(StatusCode::BAD_REQUEST, "Coupon expired");
    }
    if let Some(limit) = coupon.usage_limit
        && coupon.usage_count >= limit
    {
        return reject(StatusCode::BAD_REQUEST, "Coupon usage limit reached");
    }

    Json(coupon.clone()).into_response()
}

// =============================================================================
// Checkout & Orders
// =============================================================================

fn discount_for(state: &BackendState, code: Option<&str>, subtotal: Decimal) -> Decimal {
    let Some(code) = code else {
        return Decimal::ZERO;
    };
    let Some(coupon) = state.coupons.get(code) else {
        return Decimal::ZERO;
    };
    let now = Utc::now();
    if !coupon.is_active
        || now < coupon.valid_from
        || now > coupon.valid_to
        || subtotal < coupon.min_order_value
    {
        return Decimal::ZERO;
    }
    match coupon.kind {
        DiscountKind::Percentage => {
            let raw = subtotal * coupon.value / Decimal::ONE_HUNDRED;
            coupon.max_discount.map_or(raw, |cap| raw.min(cap))
        }
        DiscountKind::Flat => coupon.value,
    }
}

async fn checkout(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let mut state = lock(&state);
    state.checkout_calls += 1;

    if let Some(detail) = state.reject_checkout.clone() {
        return reject(StatusCode::BAD_REQUEST, &detail);
    }
    if state.cart.is_empty() {
        return reject(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let mut items = Vec::new();
    let mut subtotal = Decimal::ZERO;
    for line in &state.cart {
        let Some(stock) = state.variants.get(line.variant_id.as_str()) else {
            return reject(StatusCode::BAD_REQUEST, "Variant not found");
        };
        if stock.inventory < line.quantity {
            let detail = format!("Insufficient inventory for {}", stock.sku);
            return reject(StatusCode::BAD_REQUEST, &detail);
        }
        let line_total = line.price * Decimal::from(line.quantity);
        subtotal += line_total;
        items.push(OrderLine {
            variant_id: line.variant_id.clone(),
            sku: stock.sku.clone(),
            quantity: line.quantity,
            price: line.price,
            total: line_total,
        });
    }

    let discount = discount_for(&state, request.coupon_code.as_deref(), subtotal);
    let tax = (subtotal - discount) * Decimal::new(10, 2);
    let shipping = if subtotal >= Decimal::ONE_HUNDRED {
        Decimal::ZERO
    } else {
        Decimal::TEN
    };
    let total = (subtotal - discount + tax + shipping).round_dp(2);

    let order_id = uuid::Uuid::new_v4().to_string();
    let suffix: String = order_id.chars().take(8).collect();
    let order_number = format!(
        "ORD-{}-{}",
        Utc::now().format("%Y%m%d"),
        suffix.to_uppercase()
    );
    let client_secret = format!(
        "pi_{}_secret_{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );

    let order = Order {
        id: order_id.clone().into(),
        order_number: order_number.clone(),
        items,
        subtotal,
        discount,
        tax,
        shipping,
        total,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        shipping_address: request.shipping_address,
        created_at: Utc::now(),
    };
    state.orders.insert(order_id.clone(), order);

    // The cart survives order creation; it is cleared on confirmation.
    Json(json!({
        "order_id": order_id,
        "order_number": order_number,
        "client_secret": client_secret,
        "total": total,
    }))
    .into_response()
}

async fn confirm_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let mut state = lock(&state);
    state.confirm_calls += 1;

    if state.fail_confirm {
        return reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Payment verification failed",
        );
    }

    if let Some(order) = state.orders.get_mut(&order_id) {
        order.status = OrderStatus::Confirmed;
        order.payment_status = PaymentStatus::Paid;
    } else {
        return reject(StatusCode::NOT_FOUND, "Order not found");
    }

    state.cart.clear();
    Json(json!({ "message": "Order confirmed", "status": "confirmed" })).into_response()
}

async fn list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let state = lock(&state);
    let mut orders: Vec<&Order> = state.orders.values().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(json!({ "orders": orders, "total": orders.len() })).into_response()
}

async fn get_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let state = lock(&state);
    state.orders.get(&order_id).map_or_else(
        || reject(StatusCode::NOT_FOUND, "Order not found"),
        |order| Json(order.clone()).into_response(),
    )
}
