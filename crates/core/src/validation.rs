//! Checkout precondition validation.
//!
//! Pure functions returning structured issues, independent of any HTTP or UI
//! layer. Checkout runs these before touching storage: a non-empty result
//! means the request is rejected with no mutation at all.
//!
//! Card checks are format-only (length, digits, `MM/YY`); actual gateway
//! authorization is out of scope.

use serde::Serialize;

use crate::types::{Payment, ShippingAddress};

/// One validation failure, tied to the offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    /// Create an issue for `field`.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a shipping address.
///
/// Region, locality, street and number must be non-blank; the cross-street
/// is optional.
#[must_use]
pub fn validate_address(address: &ShippingAddress) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let required = [
        ("shipping_address.region", &address.region),
        ("shipping_address.locality", &address.locality),
        ("shipping_address.street", &address.street),
        ("shipping_address.number", &address.number),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            issues.push(ValidationIssue::new(field, "must not be blank"));
        }
    }

    issues
}

/// Validate payment details.
///
/// Card payments require a 13-16 digit number, an `MM/YY` expiry with month
/// 01-12, and a 3-4 digit CVV. Cash requires nothing.
#[must_use]
pub fn validate_payment(payment: &Payment) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if let Payment::Card {
        number,
        expiry,
        cvv,
    } = payment
    {
        if !(13..=16).contains(&number.len()) || !number.chars().all(|c| c.is_ascii_digit()) {
            issues.push(ValidationIssue::new(
                "payment.number",
                "card number must be 13-16 digits",
            ));
        }

        if !is_valid_expiry(expiry) {
            issues.push(ValidationIssue::new(
                "payment.expiry",
                "expiry must be MM/YY",
            ));
        }

        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            issues.push(ValidationIssue::new("payment.cvv", "CVV must be 3-4 digits"));
        }
    }

    issues
}

/// Run all checkout precondition checks over caller-supplied input.
///
/// Cart contents are checked separately, inside the checkout transaction,
/// against the re-read server-side cart.
#[must_use]
pub fn validate_checkout(address: &ShippingAddress, payment: &Payment) -> Vec<ValidationIssue> {
    let mut issues = validate_address(address);
    issues.extend(validate_payment(payment));
    issues
}

/// `MM/YY` with a real month.
fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };

    if month.len() != 2 || year.len() != 2 {
        return false;
    }

    if !month.chars().all(|c| c.is_ascii_digit()) || !year.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    matches!(month.parse::<u8>(), Ok(1..=12))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            region: "Montevideo".to_owned(),
            locality: "Montevideo".to_owned(),
            street: "18 de Julio".to_owned(),
            number: "1234".to_owned(),
            corner: Some("Ejido".to_owned()),
        }
    }

    fn card(number: &str, expiry: &str, cvv: &str) -> Payment {
        Payment::Card {
            number: number.to_owned(),
            expiry: expiry.to_owned(),
            cvv: cvv.to_owned(),
        }
    }

    #[test]
    fn test_valid_address_passes() {
        assert!(validate_address(&address()).is_empty());
    }

    #[test]
    fn test_missing_corner_is_fine() {
        let addr = ShippingAddress {
            corner: None,
            ..address()
        };
        assert!(validate_address(&addr).is_empty());
    }

    #[test]
    fn test_blank_fields_reported_per_field() {
        let addr = ShippingAddress {
            region: String::new(),
            street: "   ".to_owned(),
            ..address()
        };
        let issues = validate_address(&addr);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.field == "shipping_address.region"));
        assert!(issues.iter().any(|i| i.field == "shipping_address.street"));
    }

    #[test]
    fn test_card_number_length_boundaries() {
        // 12 digits: too short
        assert!(!validate_payment(&card("411111111111", "12/27", "123")).is_empty());
        // 13 and 16 digits: pass the format check
        assert!(validate_payment(&card("4111111111111", "12/27", "123")).is_empty());
        assert!(validate_payment(&card("4111111111111111", "12/27", "123")).is_empty());
        // 17 digits: too long
        assert!(!validate_payment(&card("41111111111111111", "12/27", "123")).is_empty());
    }

    #[test]
    fn test_card_number_must_be_digits() {
        let issues = validate_payment(&card("41111111111111ab", "12/27", "123"));
        assert!(issues.iter().any(|i| i.field == "payment.number"));
    }

    #[test]
    fn test_expiry_format() {
        assert!(validate_payment(&card("4111111111111111", "01/29", "123")).is_empty());
        for bad in ["13/27", "00/27", "1/27", "12-27", "12/2027", "ab/cd"] {
            let issues = validate_payment(&card("4111111111111111", bad, "123"));
            assert!(
                issues.iter().any(|i| i.field == "payment.expiry"),
                "expected {bad} to be rejected"
            );
        }
    }

    #[test]
    fn test_cvv_format() {
        assert!(validate_payment(&card("4111111111111111", "12/27", "1234")).is_empty());
        for bad in ["12", "12345", "12a"] {
            let issues = validate_payment(&card("4111111111111111", "12/27", bad));
            assert!(issues.iter().any(|i| i.field == "payment.cvv"));
        }
    }

    #[test]
    fn test_cash_needs_no_details() {
        assert!(validate_payment(&Payment::Cash).is_empty());
    }

    #[test]
    fn test_validate_checkout_combines_issues() {
        let addr = ShippingAddress {
            number: String::new(),
            ..address()
        };
        let issues = validate_checkout(&addr, &card("123", "nope", "1"));
        assert_eq!(issues.len(), 4);
    }
}
