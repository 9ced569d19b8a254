//! Database operations for the storefront `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` / `user_passwords` - Site authentication
//! - `products` - Catalog (read-only to cart/order logic)
//! - `carts` / `cart_lines` - Server-owned carts for authenticated users
//! - `orders` / `order_lines` - Immutable order snapshots
//! - `addresses` - User shipping addresses
//!
//! The tower-sessions table lives in its own `tower_sessions` schema,
//! created by migration like everything else.
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p ceibo-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod addresses;
pub mod carts;
pub mod orders;
pub mod products;
pub mod users;

/// Errors surfaced by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness or concurrency conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value could not be interpreted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
