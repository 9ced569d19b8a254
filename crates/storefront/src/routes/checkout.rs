//! Checkout route.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ceibo_core::{Order, Payment, ShippingAddress};

use crate::db::orders::PgCheckoutStore;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::services::checkout::{CheckoutRequest, place_order};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/checkout", post(checkout))
}

#[derive(Debug, Deserialize)]
struct CheckoutBody {
    shipping_address: ShippingAddress,
    payment: Payment,
    shipping_tier: String,
}

/// The created order plus the tier's delivery-window estimate.
#[derive(Debug, Serialize)]
struct CheckoutResponse {
    #[serde(flatten)]
    order: Order,
    delivery_estimate: &'static str,
}

/// Place an order from the customer's server-side cart.
///
/// Guests get 401; carts live server-side, so the body carries only the
/// address, payment details and shipping tier.
#[instrument(skip_all, fields(user_id = %auth.0.id))]
async fn checkout(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    let store = PgCheckoutStore::new(state.pool().clone());

    let request = CheckoutRequest {
        shipping_address: body.shipping_address,
        payment: body.payment,
        shipping_tier: body.shipping_tier,
    };

    let order = place_order(
        &store,
        auth.0.id,
        request,
        state.config().tax_rate,
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            delivery_estimate: order.shipping_tier.estimate(),
            order,
        }),
    ))
}
