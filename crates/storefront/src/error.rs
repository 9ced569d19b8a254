//! Unified error handling for the storefront API.
//!
//! Every handler returns `Result<_, AppError>`; conversion into an HTTP
//! response happens in exactly one place. Server-side failures are reported
//! to Sentry and answered with a generic body; everything else maps to a
//! structured JSON error the client can act on.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use ceibo_core::validation::ValidationIssue;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation; carries per-field issues.
    #[error("validation failed ({} issue(s))", .0.len())]
    Validation(Vec<ValidationIssue>),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not authenticated.
    #[error("unauthorized")]
    Unauthorized,

    /// Malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(RepositoryError),

    /// Anything else that should read as a server fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound("resource not found".to_owned()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Database(other),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Validation(issues) => Self::Validation(issues),
            CheckoutError::ProductMissing(id) => {
                Self::Conflict(format!("product {id} is no longer available"))
            }
            CheckoutError::Repository(inner) => inner.into(),
        }
    }
}

impl From<CartError> for AppError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::InvalidQuantity => Self::Validation(vec![ValidationIssue::new(
                "quantity",
                "quantity must be at least 1",
            )]),
            CartError::Session(inner) => Self::Internal(inner.to_string()),
            CartError::Repository(inner) => inner.into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidEmail(inner) => Self::Validation(vec![ValidationIssue::new(
                "email",
                inner.to_string(),
            )]),
            AuthError::WeakPassword(min) => Self::Validation(vec![ValidationIssue::new(
                "password",
                format!("password must be at least {min} characters"),
            )]),
            AuthError::EmailTaken => Self::Conflict("an account with this email already exists".to_owned()),
            AuthError::InvalidCredentials => Self::Unauthorized,
            AuthError::Hash(inner) => Self::Internal(inner),
            AuthError::Repository(inner) => inner.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Report server faults with Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "storefront request error"
            );
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Validation(issues) => json!({
                "error": "validation failed",
                "issues": issues,
            }),
            Self::Database(_) | Self::Internal(_) => json!({ "error": "internal server error" }),
            Self::Unauthorized => json!({ "error": "authentication required" }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
