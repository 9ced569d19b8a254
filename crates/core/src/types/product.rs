//! Catalog product types.
//!
//! Products are owned by the catalog and read-only to cart/order logic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::CurrencyCode;

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name, captured onto order lines at checkout.
    pub name: String,
    /// Base unit price.
    pub price: Decimal,
    /// Currency for `price` and any discounted price.
    pub currency: CurrencyCode,
    /// Units in stock.
    pub stock: i32,
    /// Optional time-bounded price override (flash sale).
    pub discount: Option<DiscountWindow>,
}

/// A time-bounded override of a product's unit price.
///
/// The window is inclusive on both ends: the discounted price applies when
/// `starts_at <= now <= ends_at`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiscountWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Unit price while the window is active.
    pub discounted_price: Decimal,
}

impl DiscountWindow {
    /// Whether the window covers the given instant.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }
}
