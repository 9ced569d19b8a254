//! Catalog product repository.
//!
//! Read-only from the storefront's point of view; catalog management happens
//! elsewhere.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use ceibo_core::{CurrencyCode, DiscountWindow, Product, ProductId};

use super::RepositoryError;

#[derive(FromRow)]
pub(super) struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    currency: String,
    stock: i32,
    discount_price: Option<Decimal>,
    discount_starts_at: Option<DateTime<Utc>>,
    discount_ends_at: Option<DateTime<Utc>>,
}

impl ProductRow {
    pub(super) fn into_product(self) -> Result<Product, RepositoryError> {
        let currency: CurrencyCode = self.currency.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;

        // A discount exists only when all three columns are set; partial
        // rows are ignored rather than guessed at.
        let discount = match (
            self.discount_price,
            self.discount_starts_at,
            self.discount_ends_at,
        ) {
            (Some(discounted_price), Some(starts_at), Some(ends_at)) => Some(DiscountWindow {
                starts_at,
                ends_at,
                discounted_price,
            }),
            _ => None,
        };

        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            price: self.price,
            currency,
            stock: self.stock,
            discount,
        })
    }
}

pub(super) const PRODUCT_COLUMNS: &str = "id, name, price, currency, stock, \
     discount_price, discount_starts_at, discount_ends_at";

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// List all products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id DESC"))
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }
}
