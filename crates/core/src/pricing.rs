//! Pricing resolution and cart totals.
//!
//! Prices are resolved from the product and the current instant - never from
//! a client-supplied value - and the resolution is repeated at order-commit
//! time inside the checkout transaction. Everything here is pure.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{CartLine, CurrencyCode, OrderLineDraft, Product, ShippingTier};

/// Result of resolving a product's unit price at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectivePrice {
    pub unit_price: Decimal,
    pub is_discounted: bool,
    /// Rounded percentage off the base price, when discounted.
    pub discount_percent: Option<u32>,
}

/// Totals and line snapshots for a cart, priced at `now`.
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub lines: Vec<OrderLineDraft>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
}

/// Resolve the effective unit price of a product at `now`.
///
/// If the product has a discount window covering `now`, the discounted price
/// applies and `discount_percent = round((base - discounted) / base * 100)`.
/// Otherwise the base price applies. The product is never mutated.
#[must_use]
pub fn effective_price(product: &Product, now: DateTime<Utc>) -> EffectivePrice {
    match &product.discount {
        Some(window) if window.contains(now) => {
            let percent = if product.price.is_zero() {
                None
            } else {
                ((product.price - window.discounted_price) / product.price * Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_u32()
            };
            EffectivePrice {
                unit_price: window.discounted_price,
                is_discounted: true,
                discount_percent: percent,
            }
        }
        _ => EffectivePrice {
            unit_price: product.price,
            is_discounted: false,
            discount_percent: None,
        },
    }
}

/// Price a cart at `now`, producing order-line snapshots and totals.
///
/// `items` pairs each cart line with its (already loaded) product. Totals:
///
/// - `subtotal = sum(unit_price * quantity)`
/// - `shipping_cost = subtotal * tier rate`
/// - `tax = subtotal * tax_rate`
/// - `total = subtotal + tax + shipping_cost`
///
/// Monetary values are rounded to 2 decimal places, half away from zero.
#[must_use]
pub fn price_cart(
    items: &[(CartLine, Product)],
    tier: ShippingTier,
    tax_rate: Decimal,
    now: DateTime<Utc>,
) -> PricedCart {
    let currency = items
        .first()
        .map_or_else(CurrencyCode::default, |(_, p)| p.currency);

    let lines: Vec<OrderLineDraft> = items
        .iter()
        .map(|(line, product)| {
            let unit_price = effective_price(product, now).unit_price;
            OrderLineDraft {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price,
                quantity: line.quantity,
                line_subtotal: round_money(unit_price * Decimal::from(line.quantity)),
            }
        })
        .collect();

    let subtotal: Decimal = lines.iter().map(|l| l.line_subtotal).sum();
    let shipping_cost = round_money(subtotal * tier.rate());
    let tax = round_money(subtotal * tax_rate);
    let total = subtotal + tax + shipping_cost;

    PricedCart {
        lines,
        subtotal,
        tax,
        shipping_cost,
        total,
        currency,
    }
}

fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{DiscountWindow, ProductId};
    use chrono::Duration;

    fn product(id: i32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product-{id}"),
            price: Decimal::from(price),
            currency: CurrencyCode::UYU,
            stock: 100,
            discount: None,
        }
    }

    fn discounted_product(id: i32, price: i64, discounted: i64, now: DateTime<Utc>) -> Product {
        Product {
            discount: Some(DiscountWindow {
                starts_at: now - Duration::hours(1),
                ends_at: now + Duration::hours(1),
                discounted_price: Decimal::from(discounted),
            }),
            ..product(id, price)
        }
    }

    #[test]
    fn test_effective_price_without_discount() {
        let now = Utc::now();
        let resolved = effective_price(&product(1, 1000), now);
        assert_eq!(resolved.unit_price, Decimal::from(1000));
        assert!(!resolved.is_discounted);
        assert_eq!(resolved.discount_percent, None);
    }

    #[test]
    fn test_effective_price_inside_window() {
        let now = Utc::now();
        let resolved = effective_price(&discounted_product(1, 1000, 800, now), now);
        assert_eq!(resolved.unit_price, Decimal::from(800));
        assert!(resolved.is_discounted);
        assert_eq!(resolved.discount_percent, Some(20));
    }

    #[test]
    fn test_effective_price_outside_window() {
        let now = Utc::now();
        let p = discounted_product(1, 1000, 800, now);
        let later = now + Duration::hours(2);
        let resolved = effective_price(&p, later);
        assert_eq!(resolved.unit_price, Decimal::from(1000));
        assert!(!resolved.is_discounted);
    }

    #[test]
    fn test_discount_percent_rounds_to_nearest() {
        let now = Utc::now();
        // (1000 - 667) / 1000 = 33.3% -> 33
        let resolved = effective_price(&discounted_product(1, 1000, 667, now), now);
        assert_eq!(resolved.discount_percent, Some(33));
        // (1000 - 665) / 1000 = 33.5% -> 34 (half away from zero)
        let resolved = effective_price(&discounted_product(1, 1000, 665, now), now);
        assert_eq!(resolved.discount_percent, Some(34));
    }

    #[test]
    fn test_price_cart_express_scenario() {
        // cart = [{A, base 1000, qty 2}], express (7%), tax 22%
        let now = Utc::now();
        let items = vec![(CartLine::new(ProductId::new(1), 2), product(1, 1000))];
        let priced = price_cart(&items, ShippingTier::Express, Decimal::new(22, 2), now);

        assert_eq!(priced.subtotal, Decimal::from(2000));
        assert_eq!(priced.tax, Decimal::from(440));
        assert_eq!(priced.shipping_cost, Decimal::from(140));
        assert_eq!(priced.total, Decimal::from(2580));
    }

    #[test]
    fn test_price_cart_captures_discounted_price() {
        // B discounted 1000 -> 800, qty 1, standard (5%), tax 22%
        let now = Utc::now();
        let items = vec![(
            CartLine::new(ProductId::new(2), 1),
            discounted_product(2, 1000, 800, now),
        )];
        let priced = price_cart(&items, ShippingTier::Standard, Decimal::new(22, 2), now);

        assert_eq!(priced.subtotal, Decimal::from(800));
        assert_eq!(priced.tax, Decimal::from(176));
        assert_eq!(priced.shipping_cost, Decimal::from(40));
        assert_eq!(priced.total, Decimal::from(1016));

        // The order line records the discounted price, not the base price.
        let line = priced.lines.first().unwrap();
        assert_eq!(line.unit_price, Decimal::from(800));
        assert_eq!(line.line_subtotal, Decimal::from(800));
    }

    #[test]
    fn test_price_cart_total_formula() {
        let now = Utc::now();
        let items = vec![
            (CartLine::new(ProductId::new(1), 3), product(1, 250)),
            (CartLine::new(ProductId::new(2), 1), product(2, 1299)),
        ];
        let tax_rate = Decimal::new(22, 2);
        let priced = price_cart(&items, ShippingTier::Priority, tax_rate, now);

        let expected_subtotal: Decimal = priced.lines.iter().map(|l| l.line_subtotal).sum();
        assert_eq!(priced.subtotal, expected_subtotal);
        assert_eq!(
            priced.total,
            priced.subtotal + priced.tax + priced.shipping_cost
        );
    }

    #[test]
    fn test_price_cart_empty() {
        let priced = price_cart(
            &[],
            ShippingTier::Standard,
            Decimal::new(22, 2),
            Utc::now(),
        );
        assert!(priced.lines.is_empty());
        assert_eq!(priced.total, Decimal::ZERO);
    }
}
