//! Business logic services.

pub mod auth;
pub mod cart;
pub mod checkout;
