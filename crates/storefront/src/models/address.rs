//! Saved shipping address model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ceibo_core::{AddressId, ShippingAddress, UserId};

/// An entry in a user's address book.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// The address fields themselves, flattened into the JSON body.
    #[serde(flatten)]
    pub address: ShippingAddress,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
