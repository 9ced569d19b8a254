//! Server-owned cart repository.
//!
//! The cart row is created lazily on the first write and survives `clear`;
//! only its lines come and go. Quantity accumulation on `add_line` happens
//! in the upsert itself so concurrent adds never lose updates to a
//! read-modify-write race.

use sqlx::{FromRow, PgPool};

use ceibo_core::{CartLine, ProductId, UserId};

use super::RepositoryError;

#[derive(FromRow)]
struct CartLineRow {
    product_id: i32,
    quantity: i32,
}

impl CartLineRow {
    fn into_line(self) -> Result<CartLine, RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "non-positive cart quantity for product {}",
                self.product_id
            ))
        })?;
        Ok(CartLine::new(ProductId::new(self.product_id), quantity))
    }
}

/// Repository for authenticated users' carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the cart lines for a user.
    ///
    /// Returns an empty list when the user has no cart yet; the cart is only
    /// created on first write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows: Vec<CartLineRow> = sqlx::query_as(
            r"
            SELECT cl.product_id, cl.quantity
            FROM cart_lines cl
            JOIN carts c ON c.id = cl.cart_id
            WHERE c.user_id = $1
            ORDER BY cl.product_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartLineRow::into_line).collect()
    }

    /// Add `quantity` of a product to the user's cart.
    ///
    /// Creates the cart if it doesn't exist. If a line for the product
    /// already exists the quantities accumulate atomically in the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn add_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            WITH cart AS (
                INSERT INTO carts (user_id)
                VALUES ($1)
                ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
                RETURNING id
            )
            INSERT INTO cart_lines (cart_id, product_id, quantity)
            SELECT cart.id, $2, $3 FROM cart
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set the quantity of a product line, creating it if absent.
    ///
    /// Callers handle `quantity < 1` by removing the line instead; a zero
    /// quantity is never stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            WITH cart AS (
                INSERT INTO carts (user_id)
                VALUES ($1)
                ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
                RETURNING id
            )
            INSERT INTO cart_lines (cart_id, product_id, quantity)
            SELECT cart.id, $2, $3 FROM cart
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a product line. Removing an absent line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn remove_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM cart_lines cl
            USING carts c
            WHERE cl.cart_id = c.id AND c.user_id = $1 AND cl.product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Empty the user's cart. The cart row itself is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM cart_lines cl
            USING carts c
            WHERE cl.cart_id = c.id AND c.user_id = $1
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
