//! Shipping tiers.
//!
//! Each tier charges a fixed percentage of the order subtotal and carries a
//! textual delivery-window estimate. Percentage-of-subtotal is what the
//! business currently uses; it is deliberately not extended with flat or
//! weight-based fees.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named shipping-speed option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingTier {
    /// Fastest option, 15% of subtotal.
    Priority,
    /// 7% of subtotal.
    Express,
    /// Cheapest option, 5% of subtotal.
    Standard,
}

impl ShippingTier {
    /// The shipping cost as a fraction of the order subtotal.
    #[must_use]
    pub fn rate(self) -> Decimal {
        match self {
            Self::Priority => Decimal::new(15, 2),
            Self::Express => Decimal::new(7, 2),
            Self::Standard => Decimal::new(5, 2),
        }
    }

    /// Human-readable delivery-window estimate.
    #[must_use]
    pub const fn estimate(self) -> &'static str {
        match self {
            Self::Priority => "1-2 business days",
            Self::Express => "3-5 business days",
            Self::Standard => "5-10 business days",
        }
    }
}

impl std::fmt::Display for ShippingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Priority => write!(f, "priority"),
            Self::Express => write!(f, "express"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

impl std::str::FromStr for ShippingTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(Self::Priority),
            "express" => Ok(Self::Express),
            "standard" => Ok(Self::Standard),
            _ => Err(format!("unknown shipping tier: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        assert_eq!(ShippingTier::Priority.rate(), Decimal::new(15, 2));
        assert_eq!(ShippingTier::Express.rate(), Decimal::new(7, 2));
        assert_eq!(ShippingTier::Standard.rate(), Decimal::new(5, 2));
    }

    #[test]
    fn test_parse_known_tiers() {
        assert_eq!(
            "express".parse::<ShippingTier>().unwrap(),
            ShippingTier::Express
        );
        assert!("overnight".parse::<ShippingTier>().is_err());
    }

    #[test]
    fn test_display_from_str_roundtrip() {
        for tier in [
            ShippingTier::Priority,
            ShippingTier::Express,
            ShippingTier::Standard,
        ] {
            assert_eq!(tier.to_string().parse::<ShippingTier>().unwrap(), tier);
        }
    }
}
