//! Order types.
//!
//! An order is an immutable snapshot taken at checkout: line name and price
//! are copied from the catalog at that instant and never re-derived from the
//! live product afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, OrderLineId, ProductId, UserId};
use super::payment::PaymentMethod;
use super::price::CurrencyCode;
use super::shipping::ShippingTier;
use super::status::OrderStatus;

/// A structured shipping address.
///
/// `corner` (the cross-street) is optional; every other field is required
/// non-blank at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Department / state.
    pub region: String,
    /// City or town.
    pub locality: String,
    pub street: String,
    /// Door number.
    pub number: String,
    /// Nearest cross-street.
    pub corner: Option<String>,
}

/// A persisted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub shipping_tier: ShippingTier,
    pub lines: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub created_at: DateTime<Utc>,
}

/// A persisted order line.
///
/// `product_name` and `unit_price` were captured when the order was created;
/// later catalog edits never change them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_subtotal: Decimal,
}

/// A fully priced order, ready to persist.
///
/// Produced by [`crate::pricing::price_cart`] inside the checkout
/// transaction, after prices were resolved at commit time.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub shipping_tier: ShippingTier,
    pub lines: Vec<OrderLineDraft>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
}

/// An order line before persistence, with name and price already snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineDraft {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_subtotal: Decimal,
}
