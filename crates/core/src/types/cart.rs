//! Cart line types and guest/user cart reconciliation.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// One (product, quantity) pairing within a cart.
///
/// A cart holds at most one line per product; quantity is always >= 1.
/// Removal is modeled by deleting the line, never by storing a zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    /// Create a new cart line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Merge a guest cart into a user cart.
///
/// For each guest line, if the user cart already holds that product the
/// quantities sum, saturating at `u32::MAX`; otherwise the guest line is
/// appended unchanged. Invoked
/// once, at the moment a guest authenticates; with an empty guest cart this
/// is a no-op, so a second invocation after the guest cart was discarded
/// changes nothing.
#[must_use]
pub fn merge_lines(guest_lines: &[CartLine], user_lines: &[CartLine]) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = user_lines.to_vec();

    for guest in guest_lines {
        match merged.iter_mut().find(|l| l.product_id == guest.product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(guest.quantity),
            None => merged.push(*guest),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, qty: u32) -> CartLine {
        CartLine::new(ProductId::new(id), qty)
    }

    fn quantity_of(lines: &[CartLine], id: i32) -> Option<u32> {
        lines
            .iter()
            .find(|l| l.product_id == ProductId::new(id))
            .map(|l| l.quantity)
    }

    #[test]
    fn test_merge_sums_shared_products() {
        let merged = merge_lines(&[line(1, 2), line(3, 1)], &[line(1, 1), line(2, 4)]);

        assert_eq!(merged.len(), 3);
        assert_eq!(quantity_of(&merged, 1), Some(3));
        assert_eq!(quantity_of(&merged, 2), Some(4));
        assert_eq!(quantity_of(&merged, 3), Some(1));
    }

    #[test]
    fn test_merge_quantities_commutative_per_product() {
        let a = [line(1, 2), line(2, 5)];
        let b = [line(2, 3), line(3, 7)];

        let ab = merge_lines(&a, &b);
        let ba = merge_lines(&b, &a);

        for id in 1..=3 {
            assert_eq!(quantity_of(&ab, id), quantity_of(&ba, id));
        }
    }

    #[test]
    fn test_merge_empty_guest_is_noop() {
        let user = [line(1, 2), line(2, 1)];

        let once = merge_lines(&[], &user);
        assert_eq!(once, user.to_vec());

        // Repeating the merge after the guest cart was discarded changes nothing.
        let twice = merge_lines(&[], &once);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_merge_saturates_instead_of_overflowing() {
        let merged = merge_lines(&[line(1, 2)], &[line(1, u32::MAX - 1)]);
        assert_eq!(quantity_of(&merged, 1), Some(u32::MAX));
    }

    #[test]
    fn test_merge_into_empty_user_cart() {
        let guest = [line(4, 2)];
        assert_eq!(merge_lines(&guest, &[]), guest.to_vec());
    }
}
