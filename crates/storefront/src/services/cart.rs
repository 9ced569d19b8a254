//! Cart service: one API over two storage backends.
//!
//! Guests keep their cart in the session; logged-in customers keep theirs in
//! `PostgreSQL`, keyed by user. Handlers never pick a backend themselves:
//! [`CartService::for_identity`] does, from the resolved identity.
//!
//! On login the guest cart is merged into the user's cart line by line
//! through the same accumulating upsert that `add` uses, then dropped from
//! the session.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use ceibo_core::{CartLine, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::models::session_keys;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Session store failure (guest carts only).
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Database failure (user carts only).
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The requested quantity is invalid for the operation.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Storage backend for a cart.
pub trait CartBackend {
    /// Current cart lines.
    async fn lines(&self) -> Result<Vec<CartLine>, CartError>;

    /// Add `quantity` of a product, accumulating with any existing line.
    async fn add(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError>;

    /// Overwrite a line's quantity, creating the line if absent.
    async fn set_quantity(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError>;

    /// Remove a line; absent lines are a no-op.
    async fn remove(&self, product_id: ProductId) -> Result<(), CartError>;

    /// Empty the cart.
    async fn clear(&self) -> Result<(), CartError>;
}

// =============================================================================
// Guest cart (session-backed)
// =============================================================================

/// Guest cart stored in the session under [`session_keys::GUEST_CART`].
///
/// A payload that no longer deserializes is treated as an empty cart and
/// overwritten on the next write.
pub struct SessionCart<'a> {
    session: &'a Session,
}

impl<'a> SessionCart<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    async fn read(&self) -> Result<Vec<CartLine>, CartError> {
        match self.session.get::<Vec<CartLine>>(session_keys::GUEST_CART).await {
            Ok(Some(lines)) => Ok(lines),
            Ok(None) => Ok(Vec::new()),
            Err(_) => {
                tracing::warn!("unreadable guest cart in session, starting fresh");
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, lines: Vec<CartLine>) -> Result<(), CartError> {
        self.session
            .insert(session_keys::GUEST_CART, lines)
            .await?;
        Ok(())
    }
}

impl CartBackend for SessionCart<'_> {
    async fn lines(&self) -> Result<Vec<CartLine>, CartError> {
        self.read().await
    }

    async fn add(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let mut lines = self.read().await?;
        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => lines.push(CartLine::new(product_id, quantity)),
        }
        self.write(lines).await
    }

    async fn set_quantity(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let mut lines = self.read().await?;
        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => lines.push(CartLine::new(product_id, quantity)),
        }
        self.write(lines).await
    }

    async fn remove(&self, product_id: ProductId) -> Result<(), CartError> {
        let mut lines = self.read().await?;
        lines.retain(|l| l.product_id != product_id);
        self.write(lines).await
    }

    async fn clear(&self) -> Result<(), CartError> {
        self.session
            .remove::<Vec<CartLine>>(session_keys::GUEST_CART)
            .await?;
        Ok(())
    }
}

// =============================================================================
// User cart (database-backed)
// =============================================================================

/// Database-backed cart for an authenticated customer.
pub struct DbCart<'a> {
    repo: CartRepository<'a>,
    user_id: UserId,
}

impl<'a> DbCart<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, user_id: UserId) -> Self {
        Self {
            repo: CartRepository::new(pool),
            user_id,
        }
    }
}

impl CartBackend for DbCart<'_> {
    async fn lines(&self) -> Result<Vec<CartLine>, CartError> {
        Ok(self.repo.lines(self.user_id).await?)
    }

    async fn add(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        Ok(self.repo.add_line(self.user_id, product_id, quantity).await?)
    }

    async fn set_quantity(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        Ok(self
            .repo
            .set_quantity(self.user_id, product_id, quantity)
            .await?)
    }

    async fn remove(&self, product_id: ProductId) -> Result<(), CartError> {
        Ok(self.repo.remove_line(self.user_id, product_id).await?)
    }

    async fn clear(&self) -> Result<(), CartError> {
        Ok(self.repo.clear(self.user_id).await?)
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// The cart for the current request, whichever backend owns it.
pub enum CartService<'a> {
    Guest(SessionCart<'a>),
    User(DbCart<'a>),
}

impl<'a> CartService<'a> {
    /// Pick the backend for the resolved identity.
    #[must_use]
    pub const fn for_identity(
        pool: &'a PgPool,
        session: &'a Session,
        user_id: Option<UserId>,
    ) -> Self {
        match user_id {
            Some(user_id) => Self::User(DbCart::new(pool, user_id)),
            None => Self::Guest(SessionCart::new(session)),
        }
    }

    /// Current cart lines.
    ///
    /// # Errors
    ///
    /// Propagates backend failures as [`CartError`].
    pub async fn lines(&self) -> Result<Vec<CartLine>, CartError> {
        match self {
            Self::Guest(cart) => cart.lines().await,
            Self::User(cart) => cart.lines().await,
        }
    }

    /// Add `quantity` of a product, accumulating with any existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity.
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        match self {
            Self::Guest(cart) => cart.add(product_id, quantity).await,
            Self::User(cart) => cart.add(product_id, quantity).await,
        }
    }

    /// Set a line's quantity. Zero removes the line instead; a zero quantity
    /// is never stored.
    ///
    /// # Errors
    ///
    /// Propagates backend failures as [`CartError`].
    pub async fn set_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(product_id).await;
        }
        match self {
            Self::Guest(cart) => cart.set_quantity(product_id, quantity).await,
            Self::User(cart) => cart.set_quantity(product_id, quantity).await,
        }
    }

    /// Remove a line; absent lines are a no-op.
    ///
    /// # Errors
    ///
    /// Propagates backend failures as [`CartError`].
    pub async fn remove(&self, product_id: ProductId) -> Result<(), CartError> {
        match self {
            Self::Guest(cart) => cart.remove(product_id).await,
            Self::User(cart) => cart.remove(product_id).await,
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Propagates backend failures as [`CartError`].
    pub async fn clear(&self) -> Result<(), CartError> {
        match self {
            Self::Guest(cart) => cart.clear().await,
            Self::User(cart) => cart.clear().await,
        }
    }
}

/// Merge the session's guest cart into the user's database cart, then drop
/// it from the session. Called on login.
///
/// Each guest line goes through the accumulating upsert, so quantities for
/// products already in the user's cart sum rather than overwrite.
///
/// # Errors
///
/// Propagates backend failures as [`CartError`]. Lines merged before the
/// failure have already left the session, so a retried login picks up only
/// the remainder and never double-adds.
pub async fn merge_guest_cart(
    pool: &PgPool,
    session: &Session,
    user_id: UserId,
) -> Result<(), CartError> {
    let guest = SessionCart::new(session);
    let user_cart = DbCart::new(pool, user_id);

    let merged = merge_into(&guest, &user_cart).await?;
    if merged > 0 {
        tracing::info!(
            user_id = %user_id,
            merged_lines = merged,
            "guest cart merged on login"
        );
    }

    Ok(())
}

/// Move every guest line into `user_cart`, returning how many were merged.
///
/// Each line is removed from the session as soon as its upsert lands, so a
/// mid-merge failure leaves the session holding exactly the unmerged lines.
async fn merge_into<B: CartBackend>(
    guest: &SessionCart<'_>,
    user_cart: &B,
) -> Result<usize, CartError> {
    let lines = guest.lines().await?;
    if lines.is_empty() {
        return Ok(0);
    }

    for line in &lines {
        user_cart.add(line.product_id, line.quantity).await?;
        guest.remove(line.product_id).await?;
    }

    guest.clear().await?;
    Ok(lines.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tower_sessions::{MemoryStore, Session};

    use super::*;

    fn test_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine::new(ProductId::new(id), quantity)
    }

    /// In-memory [`CartBackend`] standing in for the database cart, with an
    /// optional one-shot failure when the stored line count hits a threshold.
    #[derive(Default)]
    struct RecordingCart {
        lines: Mutex<Vec<CartLine>>,
        fail_at_len: Mutex<Option<usize>>,
    }

    impl RecordingCart {
        fn failing_at_len(len: usize) -> Self {
            Self {
                lines: Mutex::new(Vec::new()),
                fail_at_len: Mutex::new(Some(len)),
            }
        }

        fn stored(&self) -> Vec<CartLine> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl CartBackend for RecordingCart {
        async fn lines(&self) -> Result<Vec<CartLine>, CartError> {
            Ok(self.stored())
        }

        async fn add(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
            let mut lines = self.lines.lock().unwrap();
            let mut fail_at = self.fail_at_len.lock().unwrap();
            if *fail_at == Some(lines.len()) {
                *fail_at = None;
                return Err(CartError::Repository(RepositoryError::Database(
                    sqlx::Error::PoolClosed,
                )));
            }
            match lines.iter_mut().find(|l| l.product_id == product_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
                None => lines.push(CartLine::new(product_id, quantity)),
            }
            Ok(())
        }

        async fn set_quantity(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
            let mut lines = self.lines.lock().unwrap();
            match lines.iter_mut().find(|l| l.product_id == product_id) {
                Some(existing) => existing.quantity = quantity,
                None => lines.push(CartLine::new(product_id, quantity)),
            }
            Ok(())
        }

        async fn remove(&self, product_id: ProductId) -> Result<(), CartError> {
            self.lines.lock().unwrap().retain(|l| l.product_id != product_id);
            Ok(())
        }

        async fn clear(&self) -> Result<(), CartError> {
            self.lines.lock().unwrap().clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_add_zero_quantity_rejected() {
        let session = test_session();
        let cart = CartService::Guest(SessionCart::new(&session));

        let err = cart.add(ProductId::new(1), 0).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
        assert!(cart.lines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_quantity_zero_removes_line() {
        let session = test_session();
        let cart = CartService::Guest(SessionCart::new(&session));

        cart.add(ProductId::new(1), 2).await.unwrap();
        cart.add(ProductId::new(2), 5).await.unwrap();

        cart.set_quantity(ProductId::new(1), 0).await.unwrap();

        let lines = cart.lines().await.unwrap();
        assert_eq!(lines, vec![line(2, 5)]);
    }

    #[tokio::test]
    async fn test_set_quantity_zero_on_absent_line_is_noop() {
        let session = test_session();
        let cart = CartService::Guest(SessionCart::new(&session));

        cart.add(ProductId::new(1), 3).await.unwrap();
        cart.set_quantity(ProductId::new(99), 0).await.unwrap();

        assert_eq!(cart.lines().await.unwrap(), vec![line(1, 3)]);
    }

    #[tokio::test]
    async fn test_merge_moves_guest_lines_and_empties_session() {
        let session = test_session();
        let guest = SessionCart::new(&session);
        guest.add(ProductId::new(1), 2).await.unwrap();
        guest.add(ProductId::new(2), 1).await.unwrap();

        let user_cart = RecordingCart::default();
        user_cart.add(ProductId::new(1), 4).await.unwrap();

        let merged = merge_into(&guest, &user_cart).await.unwrap();

        assert_eq!(merged, 2);
        assert_eq!(user_cart.stored(), vec![line(1, 6), line(2, 1)]);
        assert!(guest.lines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_with_empty_guest_cart_is_noop() {
        let session = test_session();
        let guest = SessionCart::new(&session);
        let user_cart = RecordingCart::default();

        assert_eq!(merge_into(&guest, &user_cart).await.unwrap(), 0);
        assert!(user_cart.stored().is_empty());
    }

    #[tokio::test]
    async fn test_merge_retry_after_failure_does_not_double_add() {
        let session = test_session();
        let guest = SessionCart::new(&session);
        guest.add(ProductId::new(1), 2).await.unwrap();
        guest.add(ProductId::new(2), 3).await.unwrap();

        // Fails once the first line is stored, i.e. on the second upsert.
        let user_cart = RecordingCart::failing_at_len(1);

        let err = merge_into(&guest, &user_cart).await.unwrap_err();
        assert!(matches!(err, CartError::Repository(_)));

        // The merged line has left the session; the failed one is still there.
        assert_eq!(user_cart.stored(), vec![line(1, 2)]);
        assert_eq!(guest.lines().await.unwrap(), vec![line(2, 3)]);

        let merged = merge_into(&guest, &user_cart).await.unwrap();

        assert_eq!(merged, 1);
        assert_eq!(user_cart.stored(), vec![line(1, 2), line(2, 3)]);
        assert!(guest.lines().await.unwrap().is_empty());
    }
}
