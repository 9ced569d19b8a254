//! HTTP route handlers.
//!
//! All handlers speak JSON and return `Result<_, AppError>`; status mapping
//! lives in [`crate::error`].

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Assemble all storefront routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(products::routes())
        .merge(cart::routes())
        .merge(checkout::routes())
        .merge(orders::routes())
        .merge(addresses::routes())
}
