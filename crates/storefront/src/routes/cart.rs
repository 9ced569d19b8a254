//! Cart routes.
//!
//! Served to guests and logged-in customers alike; the backend is picked
//! per request from the resolved identity. Prices shown here are resolved
//! at request time and are informational: checkout re-resolves them inside
//! its own transaction.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use ceibo_core::pricing::effective_price;
use ceibo_core::{CartLine, ProductId};

use crate::db::products::ProductRepository;
use crate::error::AppError;
use crate::middleware::Identity;
use crate::services::cart::CartService;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(view_cart).delete(clear_cart))
        .route("/cart/lines", post(add_line))
        .route(
            "/cart/lines/{product_id}",
            put(set_quantity).delete(remove_line),
        )
}

#[derive(Debug, Serialize)]
struct CartLineResponse {
    product_id: ProductId,
    product_name: String,
    unit_price: Decimal,
    quantity: u32,
    line_subtotal: Decimal,
}

#[derive(Debug, Serialize)]
struct CartResponse {
    lines: Vec<CartLineResponse>,
    subtotal: Decimal,
}

#[derive(Debug, Deserialize)]
struct AddLineRequest {
    product_id: i32,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct SetQuantityRequest {
    quantity: u32,
}

/// Build the cart response body, pricing each line at `now`.
///
/// Lines whose product has been removed from the catalog are left out of
/// the view; they stay in storage and surface at checkout.
async fn render_cart(state: &AppState, lines: Vec<CartLine>) -> Result<CartResponse, AppError> {
    let products = ProductRepository::new(state.pool());
    let now = Utc::now();

    let mut rendered = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(product) = products.get(line.product_id).await? else {
            tracing::warn!(product_id = %line.product_id, "cart line references missing product");
            continue;
        };
        let unit_price = effective_price(&product, now).unit_price;
        rendered.push(CartLineResponse {
            product_id: product.id,
            product_name: product.name,
            unit_price,
            quantity: line.quantity,
            line_subtotal: unit_price * Decimal::from(line.quantity),
        });
    }

    let subtotal = rendered.iter().map(|l| l.line_subtotal).sum();

    Ok(CartResponse {
        lines: rendered,
        subtotal,
    })
}

#[instrument(skip_all)]
async fn view_cart(
    State(state): State<AppState>,
    identity: Identity,
    session: Session,
) -> Result<Json<CartResponse>, AppError> {
    let cart = CartService::for_identity(state.pool(), &session, identity.user.map(|u| u.id));
    let lines = cart.lines().await?;

    Ok(Json(render_cart(&state, lines).await?))
}

#[instrument(skip_all, fields(product_id = body.product_id, quantity = body.quantity))]
async fn add_line(
    State(state): State<AppState>,
    identity: Identity,
    session: Session,
    Json(body): Json<AddLineRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let product_id = ProductId::new(body.product_id);

    // Reject lines for products that don't exist at all
    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id} not found")))?;

    let cart = CartService::for_identity(state.pool(), &session, identity.user.map(|u| u.id));
    cart.add(product_id, body.quantity).await?;

    let lines = cart.lines().await?;
    Ok(Json(render_cart(&state, lines).await?))
}

#[instrument(skip_all, fields(product_id, quantity = body.quantity))]
async fn set_quantity(
    State(state): State<AppState>,
    identity: Identity,
    session: Session,
    Path(product_id): Path<i32>,
    Json(body): Json<SetQuantityRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let product_id = ProductId::new(product_id);

    let cart = CartService::for_identity(state.pool(), &session, identity.user.map(|u| u.id));
    cart.set_quantity(product_id, body.quantity).await?;

    let lines = cart.lines().await?;
    Ok(Json(render_cart(&state, lines).await?))
}

#[instrument(skip_all, fields(product_id))]
async fn remove_line(
    State(state): State<AppState>,
    identity: Identity,
    session: Session,
    Path(product_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let cart = CartService::for_identity(state.pool(), &session, identity.user.map(|u| u.id));
    cart.remove(ProductId::new(product_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
async fn clear_cart(
    State(state): State<AppState>,
    identity: Identity,
    session: Session,
) -> Result<StatusCode, AppError> {
    let cart = CartService::for_identity(state.pool(), &session, identity.user.map(|u| u.id));
    cart.clear().await?;

    Ok(StatusCode::NO_CONTENT)
}
