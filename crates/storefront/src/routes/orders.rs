//! Order history routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::instrument;

use ceibo_core::{Order, OrderId};

use crate::db::orders::OrderRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/cancel", post(cancel_order))
}

#[instrument(skip_all, fields(user_id = %auth.0.id))]
async fn list_orders(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(auth.0.id)
        .await?;

    Ok(Json(orders))
}

#[instrument(skip_all, fields(user_id = %auth.0.id, order_id = id))]
async fn get_order(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .get(auth.0.id, OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order))
}

/// Cancel an order that hasn't shipped yet.
#[instrument(skip_all, fields(user_id = %auth.0.id, order_id = id))]
async fn cancel_order(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .cancel(auth.0.id, OrderId::new(id))
        .await?;

    tracing::info!(order_id = %order.id, "order cancelled");

    Ok(Json(order))
}
