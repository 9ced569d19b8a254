//! Shipping address book repository.
//!
//! Addresses are keyed by user; at most one per user is flagged default,
//! enforced by a partial unique index and the transactional `set_default`.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use ceibo_core::{AddressId, ShippingAddress, UserId};

use super::RepositoryError;
use crate::models::address::Address;

#[derive(FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    region: String,
    locality: String,
    street: String,
    number: String,
    corner: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(r: AddressRow) -> Self {
        Self {
            id: AddressId::new(r.id),
            user_id: UserId::new(r.user_id),
            address: ShippingAddress {
                region: r.region,
                locality: r.locality,
                street: r.street,
                number: r.number,
                corner: r.corner,
            },
            is_default: r.is_default,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const ADDRESS_COLUMNS: &str =
    "id, user_id, region, locality, street, number, corner, is_default, created_at, updated_at";

/// Repository for the shipping address book.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses
             WHERE user_id = $1
             ORDER BY is_default DESC, created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get one of the user's addresses by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Create an address. When `is_default` is set, any previous default is
    /// demoted in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
        is_default: bool,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if is_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let row: AddressRow = sqlx::query_as(&format!(
            "INSERT INTO addresses (user_id, region, locality, street, number, corner, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&address.region)
        .bind(&address.locality)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.corner)
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Address::from(row))
    }

    /// Update an address's fields (the default flag is managed separately).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't belong to
    /// the user, `RepositoryError::Database` otherwise.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        address: &ShippingAddress,
    ) -> Result<Address, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(&format!(
            "UPDATE addresses
             SET region = $3, locality = $4, street = $5, number = $6, corner = $7,
                 updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&address.region)
        .bind(&address.locality)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.corner)
        .fetch_optional(self.pool)
        .await?;

        row.map(Address::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete an address.
    ///
    /// Returns `true` if the address was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flag an address as the user's default, demoting any previous default
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't belong to
    /// the user, `RepositoryError::Database` otherwise.
    pub async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result =
            sqlx::query("UPDATE addresses SET is_default = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}
