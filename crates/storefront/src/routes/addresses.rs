//! Address book routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;

use ceibo_core::validation::validate_address;
use ceibo_core::{AddressId, ShippingAddress};

use crate::db::addresses::AddressRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::Address;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/account/addresses", get(list_addresses).post(create_address))
        .route("/account/addresses/{id}", put(update_address).delete(delete_address))
        .route("/account/addresses/{id}/default", post(set_default))
}

#[derive(Debug, Deserialize)]
struct AddressBody {
    #[serde(flatten)]
    address: ShippingAddress,
    #[serde(default)]
    is_default: bool,
}

fn check(address: &ShippingAddress) -> Result<(), AppError> {
    let issues = validate_address(address);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(issues))
    }
}

#[instrument(skip_all, fields(user_id = %auth.0.id))]
async fn list_addresses(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Address>>, AppError> {
    let addresses = AddressRepository::new(state.pool()).list(auth.0.id).await?;

    Ok(Json(addresses))
}

#[instrument(skip_all, fields(user_id = %auth.0.id))]
async fn create_address(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<AddressBody>,
) -> Result<(StatusCode, Json<Address>), AppError> {
    check(&body.address)?;

    let address = AddressRepository::new(state.pool())
        .create(auth.0.id, &body.address, body.is_default)
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

#[instrument(skip_all, fields(user_id = %auth.0.id, address_id = id))]
async fn update_address(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i32>,
    Json(body): Json<AddressBody>,
) -> Result<Json<Address>, AppError> {
    check(&body.address)?;

    let address = AddressRepository::new(state.pool())
        .update(auth.0.id, AddressId::new(id), &body.address)
        .await?;

    Ok(Json(address))
}

#[instrument(skip_all, fields(user_id = %auth.0.id, address_id = id))]
async fn delete_address(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let deleted = AddressRepository::new(state.pool())
        .delete(auth.0.id, AddressId::new(id))
        .await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("address {id} not found")))
    }
}

#[instrument(skip_all, fields(user_id = %auth.0.id, address_id = id))]
async fn set_default(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    AddressRepository::new(state.pool())
        .set_default(auth.0.id, AddressId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
