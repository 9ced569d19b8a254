//! Ceibo Core - Shared domain library.
//!
//! This crate provides the domain types and the pure checkout logic used by
//! the Ceibo Market components:
//! - `storefront` - Public-facing JSON API
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. Everything here is a function of its inputs,
//! which is what makes cart pricing and checkout validation directly
//! unit-testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, products, carts, orders, statuses
//! - [`pricing`] - Discount-window resolution and cart totals
//! - [`validation`] - Structured checkout precondition checks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;
pub mod validation;

pub use types::*;
