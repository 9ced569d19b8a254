//! Customer authentication routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::identity::set_current_user;
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::services::cart::merge_guest_cart;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

/// Create a customer account.
///
/// Registration does not log the customer in; the client follows up with
/// `/auth/login`.
#[instrument(skip(state, body))]
async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log a customer in.
///
/// On success the session identity is set, the session ID is rotated, and
/// any guest cart accumulated before login is merged into the customer's
/// cart.
#[instrument(skip(state, session, body))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Credentials>,
) -> Result<Json<User>, AppError> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    // Rotate the session ID across the privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    merge_guest_cart(state.pool(), &session, user.id).await?;

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        logged_in_at: Utc::now(),
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "customer logged in");

    Ok(Json(user))
}

/// Log the customer out. Always succeeds, logged in or not.
///
/// The whole session is dropped, guest cart included.
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<StatusCode, AppError> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}
