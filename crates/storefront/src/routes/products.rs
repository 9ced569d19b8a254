//! Catalog routes.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use ceibo_core::pricing::effective_price;
use ceibo_core::{Product, ProductId};

use crate::db::products::ProductRepository;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
}

/// A catalog product with its price resolved at request time.
#[derive(Debug, Serialize)]
struct ProductResponse {
    id: ProductId,
    name: String,
    /// Base catalog price, before any discount.
    price: Decimal,
    /// Price currently in effect.
    unit_price: Decimal,
    is_discounted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    discount_percent: Option<u32>,
    currency: String,
    stock: i32,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let effective = effective_price(&product, Utc::now());
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            unit_price: effective.unit_price,
            is_discounted: effective.is_discounted,
            discount_percent: effective.discount_percent,
            currency: product.currency.code().to_owned(),
            stock: product.stock,
        }
    }
}

#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = ProductRepository::new(state.pool()).list().await?;

    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;

    Ok(Json(ProductResponse::from(product)))
}
