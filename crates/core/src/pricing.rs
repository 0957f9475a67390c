//! The checkout pricing engine.
//!
//! Pure and deterministic: the same lines, discount, and policy always
//! produce the same [`Quote`]. All arithmetic is `Decimal`; nothing is
//! rounded until the final total (the reported `tax` field is rounded to
//! the minor unit for display, but the total is computed from the
//! unrounded value).
//!
//! The engine is invoked explicitly whenever cart or discount state
//! changes; it is never tied to a render cycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A cart line reduced to the two fields pricing cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    /// Unit price snapshot taken when the line was added to the cart.
    pub unit_price: Decimal,
    /// Quantity, always >= 1 (removal deletes the line instead).
    pub quantity: u32,
}

impl LineAmount {
    /// Create a line amount.
    #[must_use]
    pub const fn new(unit_price: Decimal, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }
}

/// Discount kinds a coupon can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage,
    Flat,
}

/// A validated discount descriptor, as produced by the coupon validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discount {
    pub kind: DiscountKind,
    /// Percentage (0-100) or flat amount, depending on `kind`.
    pub value: Decimal,
    /// Cap on the computed discount for percentage coupons.
    pub max_discount: Option<Decimal>,
}

impl Discount {
    /// Compute the discount amount for a given subtotal.
    ///
    /// Percentage discounts are capped at `max_discount` when set; every
    /// discount is clamped to `[0, subtotal]` so a flat coupon can never
    /// drive the order total negative.
    #[must_use]
    pub fn amount_for(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.kind {
            DiscountKind::Percentage => {
                let pct = subtotal * self.value / Decimal::ONE_HUNDRED;
                self.max_discount.map_or(pct, |cap| pct.min(cap))
            }
            DiscountKind::Flat => self.value,
        };
        raw.min(subtotal).max(Decimal::ZERO)
    }
}

/// Which subtotal the tax rate applies to.
///
/// The checkout flow taxes the post-discount base; the cart summary
/// (which has no coupon entry) taxes the raw subtotal. Both behaviors are
/// kept behind this explicit mode until the backend settles on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaxBasis {
    /// Tax `(subtotal - discount)`. Checkout behavior, the default.
    #[default]
    PostDiscount,
    /// Tax the raw subtotal, ignoring any discount.
    PreDiscount,
}

/// Pricing policy constants.
///
/// Defaults match the order backend: free shipping at 100.00 (evaluated
/// on the pre-discount subtotal), a 10.00 flat fee otherwise, and a 10%
/// tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
    pub tax_rate: Decimal,
    pub tax_basis: TaxBasis,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::ONE_HUNDRED,
            flat_shipping_fee: Decimal::TEN,
            tax_rate: Decimal::new(10, 2),
            tax_basis: TaxBasis::default(),
        }
    }
}

/// A priced cart: the output of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Price a cart.
///
/// - `subtotal` is the exact sum of `unit_price * quantity` per line.
/// - `discount` is clamped per [`Discount::amount_for`].
/// - `shipping` is waived when the **pre-discount** subtotal reaches the
///   free-shipping threshold.
/// - `tax` applies the policy rate to the basis selected by
///   [`TaxBasis`].
/// - `total = subtotal - discount + shipping + tax`, rounded to the
///   currency minor unit as the final step only.
#[must_use]
pub fn quote(lines: &[LineAmount], discount: Option<&Discount>, policy: &PricingPolicy) -> Quote {
    let subtotal: Decimal = lines
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum();

    let discount_amount = discount.map_or(Decimal::ZERO, |d| d.amount_for(subtotal));

    let shipping = if subtotal >= policy.free_shipping_threshold {
        Decimal::ZERO
    } else {
        policy.flat_shipping_fee
    };

    let taxable = match policy.tax_basis {
        TaxBasis::PostDiscount => subtotal - discount_amount,
        TaxBasis::PreDiscount => subtotal,
    };
    let tax = taxable * policy.tax_rate;

    let total = (subtotal - discount_amount + shipping + tax).round_dp(2);

    Quote {
        subtotal,
        discount: discount_amount,
        shipping,
        tax: tax.round_dp(2),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dollars(units: i64) -> Decimal {
        Decimal::new(units, 0)
    }

    fn cents(units: i64) -> Decimal {
        Decimal::new(units, 2)
    }

    fn percentage(value: i64, cap: Option<i64>) -> Discount {
        Discount {
            kind: DiscountKind::Percentage,
            value: dollars(value),
            max_discount: cap.map(dollars),
        }
    }

    fn flat(value: i64) -> Discount {
        Discount {
            kind: DiscountKind::Flat,
            value: dollars(value),
            max_discount: None,
        }
    }

    #[test]
    fn test_subtotal_is_exact_sum() {
        let lines = [
            LineAmount::new(cents(1999), 3),
            LineAmount::new(cents(550), 2),
        ];
        let q = quote(&lines, None, &PricingPolicy::default());
        assert_eq!(q.subtotal, cents(7097));
    }

    #[test]
    fn test_empty_cart_quotes_shipping_only() {
        let q = quote(&[], None, &PricingPolicy::default());
        assert_eq!(q.subtotal, Decimal::ZERO);
        assert_eq!(q.shipping, dollars(10));
        assert_eq!(q.total, dollars(10));
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        // 120.00 subtotal, no coupon: shipping 0, tax 12.00, total 132.00
        let lines = [LineAmount::new(dollars(120), 1)];
        let q = quote(&lines, None, &PricingPolicy::default());
        assert_eq!(q.shipping, Decimal::ZERO);
        assert_eq!(q.tax, dollars(12));
        assert_eq!(q.total, dollars(132));
    }

    #[test]
    fn test_shipping_threshold_is_pre_discount() {
        // 100.00 subtotal with a flat 50 coupon still ships free: the
        // threshold looks at the raw subtotal.
        let lines = [LineAmount::new(dollars(100), 1)];
        let q = quote(&lines, Some(&flat(50)), &PricingPolicy::default());
        assert_eq!(q.shipping, Decimal::ZERO);
        assert_eq!(q.discount, dollars(50));
    }

    #[test]
    fn test_flat_coupon_under_threshold() {
        // 50.00 subtotal, flat $20: discount 20, shipping 10, tax 3, total 43
        let lines = [LineAmount::new(dollars(25), 2)];
        let q = quote(&lines, Some(&flat(20)), &PricingPolicy::default());
        assert_eq!(q.discount, dollars(20));
        assert_eq!(q.shipping, dollars(10));
        assert_eq!(q.tax, dollars(3));
        assert_eq!(q.total, dollars(43));
    }

    #[test]
    fn test_percentage_coupon_hits_cap() {
        // 200.00 subtotal, 15% capped at $20: discount 20 (not 30),
        // shipping 0, tax 18, total 198
        let lines = [LineAmount::new(dollars(200), 1)];
        let q = quote(&lines, Some(&percentage(15, Some(20))), &PricingPolicy::default());
        assert_eq!(q.discount, dollars(20));
        assert_eq!(q.shipping, Decimal::ZERO);
        assert_eq!(q.tax, dollars(18));
        assert_eq!(q.total, dollars(198));
    }

    #[test]
    fn test_percentage_coupon_below_cap() {
        let lines = [LineAmount::new(dollars(100), 1)];
        let q = quote(&lines, Some(&percentage(15, Some(20))), &PricingPolicy::default());
        assert_eq!(q.discount, dollars(15));
    }

    #[test]
    fn test_flat_discount_clamped_to_subtotal() {
        // A $40 flat coupon on a $30 cart discounts exactly $30.
        let lines = [LineAmount::new(dollars(30), 1)];
        let q = quote(&lines, Some(&flat(40)), &PricingPolicy::default());
        assert_eq!(q.discount, dollars(30));
        assert_eq!(q.tax, Decimal::ZERO);
        assert_eq!(q.total, dollars(10)); // shipping only
    }

    #[test]
    fn test_tax_basis_modes_disagree_only_with_discount() {
        let lines = [LineAmount::new(dollars(50), 1)];
        let post = PricingPolicy::default();
        let pre = PricingPolicy {
            tax_basis: TaxBasis::PreDiscount,
            ..PricingPolicy::default()
        };

        assert_eq!(quote(&lines, None, &post), quote(&lines, None, &pre));

        let q_post = quote(&lines, Some(&flat(20)), &post);
        let q_pre = quote(&lines, Some(&flat(20)), &pre);
        assert_eq!(q_post.tax, dollars(3));
        assert_eq!(q_pre.tax, dollars(5));
    }

    #[test]
    fn test_no_intermediate_rounding() {
        // 3 x 33.33 = 99.99, 7% of that is 6.9993; the quote keeps the
        // exact discount and only rounds the total.
        let lines = [LineAmount::new(cents(3333), 3)];
        let q = quote(&lines, Some(&percentage(7, None)), &PricingPolicy::default());
        assert_eq!(q.subtotal, cents(9999));
        assert_eq!(q.discount, Decimal::new(69993, 4));
        // total = 99.99 - 6.9993 + 10 + 9.29907 = 112.28977 -> 112.29
        assert_eq!(q.total, cents(11229));
    }

    #[test]
    fn test_quote_is_referentially_transparent() {
        let lines = [
            LineAmount::new(cents(1250), 4),
            LineAmount::new(cents(999), 1),
        ];
        let discount = percentage(10, Some(5));
        let policy = PricingPolicy::default();
        let first = quote(&lines, Some(&discount), &policy);
        let second = quote(&lines, Some(&discount), &policy);
        assert_eq!(first, second);
    }
}
