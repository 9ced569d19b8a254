//! Ceibo Market storefront: the customer-facing shop API.
//!
//! A JSON HTTP service over `PostgreSQL` covering the catalog, guest and
//! customer carts, checkout, order history and the address book. Domain
//! types and the pure pricing/validation logic live in `ceibo-core`; this
//! crate owns storage, sessions and the HTTP surface.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
