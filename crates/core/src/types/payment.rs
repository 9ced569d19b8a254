//! Payment method types.
//!
//! Checkout validates payment *format* only; gateway authorization is an
//! external collaborator's job and never happens here.

use serde::{Deserialize, Serialize};

/// Payment details submitted at checkout.
///
/// Tagged on `method` in JSON:
///
/// ```json
/// { "method": "card", "number": "4111111111111111", "expiry": "12/27", "cvv": "123" }
/// { "method": "cash" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Payment {
    /// Card payment; fields are format-checked before any mutation.
    Card {
        number: String,
        /// Expiry in `MM/YY` form.
        expiry: String,
        cvv: String,
    },
    /// Cash on delivery.
    Cash,
}

impl Payment {
    /// The method tag persisted onto the order (card details are not stored).
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        match self {
            Self::Card { .. } => PaymentMethod::Card,
            Self::Cash => PaymentMethod::Cash,
        }
    }
}

/// Recognized payment method tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::Cash => write!(f, "cash"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            _ => Err(format!("unknown payment method: {s}")),
        }
    }
}
