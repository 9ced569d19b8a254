//! Core types for Ceibo Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod payment;
pub mod price;
pub mod product;
pub mod shipping;
pub mod status;

pub use cart::{CartLine, merge_lines};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderDraft, OrderLine, OrderLineDraft, ShippingAddress};
pub use payment::{Payment, PaymentMethod};
pub use price::{CurrencyCode, Price};
pub use product::{DiscountWindow, Product};
pub use shipping::ShippingTier;
pub use status::OrderStatus;
