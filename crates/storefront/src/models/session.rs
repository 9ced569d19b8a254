//! Session-stored types for customer authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ceibo_core::{Email, UserId};

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
/// `logged_in_at` bounds the session's lifetime independently of cookie
/// expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub logged_in_at: DateTime<Utc>,
}

/// Session keys for storefront session data.
pub mod session_keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart's lines.
    pub const GUEST_CART: &str = "guest_cart";
}
