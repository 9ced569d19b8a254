//! Customer identity extractors.
//!
//! [`Identity`] resolves the request to either an authenticated customer or
//! a guest; [`RequireAuth`] additionally rejects guests with 401. Both treat
//! a stored identity older than 24 hours, or one that no longer
//! deserializes, as absent and scrub it from the session so the request
//! proceeds as a guest instead of failing.

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Maximum age of an authenticated identity, in hours.
const IDENTITY_MAX_AGE_HOURS: i64 = 24;

/// The caller's identity: a logged-in customer or a guest.
///
/// Never rejects; handlers that serve both audiences (the cart) match on
/// `user`.
pub struct Identity {
    pub user: Option<CurrentUser>,
}

/// Extractor that requires a logged-in customer.
///
/// Rejects guests with a 401 JSON body.
pub struct RequireAuth(pub CurrentUser);

/// Rejection for [`RequireAuth`].
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "error": "authentication required" })),
        )
            .into_response()
    }
}

/// Read the current user from the session, purging stale or unreadable
/// entries.
async fn resolve_identity(session: &Session) -> Option<CurrentUser> {
    let user: CurrentUser = match session.get(session_keys::CURRENT_USER).await {
        Ok(Some(user)) => user,
        Ok(None) => return None,
        Err(_) => {
            // Unreadable identity from an older build; drop it and continue
            // as a guest.
            let _ = session.remove::<serde_json::Value>(session_keys::CURRENT_USER).await;
            return None;
        }
    };

    if Utc::now() - user.logged_in_at > Duration::hours(IDENTITY_MAX_AGE_HOURS) {
        let _ = session.remove::<CurrentUser>(session_keys::CURRENT_USER).await;
        tracing::debug!(user_id = %user.id, "expired session identity purged");
        return None;
    }

    Some(user)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => resolve_identity(session).await,
            None => None,
        };

        Ok(Self { user })
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;
        let user = resolve_identity(session).await.ok_or(AuthRejection)?;
        Ok(Self(user))
    }
}

/// Store the customer identity in the session after login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}
