//! Customer account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ceibo_core::{Email, UserId};

/// A registered customer.
///
/// The password hash lives in its own table and never leaves the auth
/// service, so it is deliberately absent here.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
