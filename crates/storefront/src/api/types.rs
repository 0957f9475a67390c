//! Wire types for the order backend REST API.
//!
//! These mirror the backend's JSON contracts exactly; anything the client
//! computes (quotes, discounts) lives in `copperleaf-core` instead.

use chrono::{DateTime, Utc};
use copperleaf_core::pricing::{Discount, DiscountKind, LineAmount};
use copperleaf_core::{OrderId, OrderStatus, PaymentStatus, ProductId, ShippingAddress, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The authoritative cart, as returned by `GET /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Reduce the cart to the pricing engine's input.
    #[must_use]
    pub fn line_amounts(&self) -> Vec<LineAmount> {
        self.items
            .iter()
            .map(|line| LineAmount::new(line.price, line.quantity))
            .collect()
    }
}

/// One cart line. The price is the unit-price snapshot taken at add time;
/// `product` and `variant` are display metadata the backend joins in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantSummary>,
}

/// Product display metadata joined onto a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
}

/// Variant display metadata joined onto a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub id: VariantId,
    pub sku: String,
}

/// Body for `POST /cart/items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Body for `POST /checkout`.
///
/// The billing address is always a copy of the shipping address; there is
/// no separate billing entry in this flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub billing_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// Response from `POST /checkout`: the pending order plus the payment
/// processor's client secret for this attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub order_number: String,
    pub client_secret: String,
    pub total: Decimal,
}

/// Response from `POST /orders/{id}/confirm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOrderResponse {
    pub message: String,
    pub status: String,
}

impl ConfirmOrderResponse {
    /// Whether the backend actually transitioned the order to confirmed.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.status == "confirmed"
    }
}

/// A coupon document, as returned by `GET /coupons/validate/{code}`.
///
/// Coupons are immutable once issued; the client holds this snapshot only
/// for the current checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponPayload {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    #[serde(default)]
    pub min_order_value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub usage_count: u32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl CouponPayload {
    /// The discount descriptor the pricing engine consumes.
    #[must_use]
    pub fn discount(&self) -> Discount {
        Discount {
            kind: self.kind,
            value: self.value,
            max_discount: self.max_discount,
        }
    }
}

/// A read-only order projection, as returned by `GET /orders/{id}`.
/// Totals are server-priced; the client never recomputes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

/// One server-priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub variant_id: VariantId,
    pub sku: String,
    pub quantity: u32,
    pub price: Decimal,
    pub total: Decimal,
}

/// Response from `GET /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersPage {
    #[serde(default)]
    pub orders: Vec<Order>,
    pub total: u64,
}

/// Generic acknowledgement body (`{"message": "..."}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
