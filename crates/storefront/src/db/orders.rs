//! Order repository and the `PostgreSQL` checkout transaction.
//!
//! Orders are written exactly once, inside [`PgCheckoutStore`]'s
//! transaction, and are immutable afterwards except for status transitions
//! that pass the [`OrderStatus`] state machine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use ceibo_core::{
    CartLine, CurrencyCode, Order, OrderDraft, OrderId, OrderLine, OrderLineId, OrderStatus,
    PaymentMethod, Product, ProductId, ShippingAddress, ShippingTier, UserId,
};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::RepositoryError;
use crate::services::checkout::{CheckoutStore, CheckoutTx};

#[derive(FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: String,
    ship_region: String,
    ship_locality: String,
    ship_street: String,
    ship_number: String,
    ship_corner: Option<String>,
    payment_method: String,
    shipping_tier: String,
    subtotal: Decimal,
    tax: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct OrderLineRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
    line_subtotal: Decimal,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, RepositoryError> {
        let corrupt = |what: &str, err: String| {
            RepositoryError::DataCorruption(format!("invalid {what} in database: {err}"))
        };

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            status: self
                .status
                .parse::<OrderStatus>()
                .map_err(|e| corrupt("order status", e))?,
            shipping_address: ShippingAddress {
                region: self.ship_region,
                locality: self.ship_locality,
                street: self.ship_street,
                number: self.ship_number,
                corner: self.ship_corner,
            },
            payment_method: self
                .payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| corrupt("payment method", e))?,
            shipping_tier: self
                .shipping_tier
                .parse::<ShippingTier>()
                .map_err(|e| corrupt("shipping tier", e))?,
            lines,
            subtotal: self.subtotal,
            tax: self.tax,
            shipping_cost: self.shipping_cost,
            total: self.total,
            currency: self
                .currency
                .parse::<CurrencyCode>()
                .map_err(|e| corrupt("currency", e))?,
            created_at: self.created_at,
        })
    }
}

impl OrderLineRow {
    fn into_line(self) -> Result<OrderLine, RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "non-positive quantity on order line {}",
                self.id
            ))
        })?;
        Ok(OrderLine {
            id: OrderLineId::new(self.id),
            product_id: ProductId::new(self.product_id),
            product_name: self.product_name,
            unit_price: self.unit_price,
            quantity,
            line_subtotal: self.line_subtotal,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status, ship_region, ship_locality, ship_street, \
     ship_number, ship_corner, payment_method, shipping_tier, subtotal, tax, shipping_cost, \
     total, currency, created_at";

const ORDER_LINE_COLUMNS: &str =
    "id, order_id, product_id, product_name, unit_price, quantity, line_subtotal";

/// Repository for reading orders and applying status transitions.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get one of the user's orders with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let line_rows: Vec<OrderLineRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_LINE_COLUMNS} FROM order_lines WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let lines = line_rows
            .into_iter()
            .map(OrderLineRow::into_line)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(row.into_order(lines)?))
    }

    /// List the user's orders, newest first, each with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let line_rows: Vec<OrderLineRow> = sqlx::query_as(&format!(
            "SELECT l.{} FROM order_lines l
             JOIN orders o ON o.id = l.order_id
             WHERE o.user_id = $1
             ORDER BY l.id",
            ORDER_LINE_COLUMNS.replace(", ", ", l.")
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut lines_by_order: HashMap<i32, Vec<OrderLine>> = HashMap::new();
        for line_row in line_rows {
            let order_id = line_row.order_id;
            lines_by_order
                .entry(order_id)
                .or_default()
                .push(line_row.into_line()?);
        }

        rows.into_iter()
            .map(|row| {
                let lines = lines_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    /// Cancel one of the user's orders.
    ///
    /// Only orders the state machine allows to be cancelled (pending or
    /// processing) can be; anything else is a conflict.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't belong to
    /// the user, `RepositoryError::Conflict` if its status forbids
    /// cancellation.
    pub async fn cancel(&self, user_id: UserId, id: OrderId) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (status,) = status.ok_or(RepositoryError::NotFound)?;
        let status: OrderStatus = status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        if !status.can_transition(OrderStatus::Cancelled) {
            return Err(RepositoryError::Conflict(format!(
                "a {status} order cannot be cancelled"
            )));
        }

        sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .bind(OrderStatus::Cancelled.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get(user_id, id).await?.ok_or(RepositoryError::NotFound)
    }
}

// =============================================================================
// Checkout transaction
// =============================================================================

/// `PostgreSQL` implementation of the checkout storage seam.
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    /// Create a checkout store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One in-flight checkout transaction. Dropping it without committing rolls
/// everything back.
pub struct PgCheckoutTx {
    tx: Transaction<'static, Postgres>,
}

impl CheckoutStore for PgCheckoutStore {
    type Tx = PgCheckoutTx;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgCheckoutTx { tx })
    }
}

impl CheckoutTx for PgCheckoutTx {
    async fn cart_lines_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        #[derive(FromRow)]
        struct Row {
            product_id: i32,
            quantity: i32,
        }

        // Row locks on the cart lines serialize concurrent checkouts of the
        // same cart; the loser re-reads after commit and sees it empty.
        let rows: Vec<Row> = sqlx::query_as(
            r"
            SELECT cl.product_id, cl.quantity
            FROM cart_lines cl
            JOIN carts c ON c.id = cl.cart_id
            WHERE c.user_id = $1
            ORDER BY cl.product_id
            FOR UPDATE OF cl
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|r| {
                let quantity = u32::try_from(r.quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "non-positive cart quantity for product {}",
                        r.product_id
                    ))
                })?;
                Ok(CartLine::new(ProductId::new(r.product_id), quantity))
            })
            .collect()
    }

    async fn products_by_ids(
        &mut self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(&raw_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        draft: &OrderDraft,
    ) -> Result<Order, RepositoryError> {
        #[derive(FromRow)]
        struct Inserted {
            id: i32,
            created_at: DateTime<Utc>,
        }

        let inserted: Inserted = sqlx::query_as(
            r"
            INSERT INTO orders (user_id, status, ship_region, ship_locality, ship_street,
                                ship_number, ship_corner, payment_method, shipping_tier,
                                subtotal, tax, shipping_cost, total, currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, created_at
            ",
        )
        .bind(user_id)
        .bind(OrderStatus::Pending.to_string())
        .bind(&draft.shipping_address.region)
        .bind(&draft.shipping_address.locality)
        .bind(&draft.shipping_address.street)
        .bind(&draft.shipping_address.number)
        .bind(&draft.shipping_address.corner)
        .bind(draft.payment_method.to_string())
        .bind(draft.shipping_tier.to_string())
        .bind(draft.subtotal)
        .bind(draft.tax)
        .bind(draft.shipping_cost)
        .bind(draft.total)
        .bind(draft.currency.code())
        .fetch_one(&mut *self.tx)
        .await?;

        let order_id = OrderId::new(inserted.id);
        let mut lines = Vec::with_capacity(draft.lines.len());

        for line in &draft.lines {
            let (line_id,): (i32,) = sqlx::query_as(
                r"
                INSERT INTO order_lines (order_id, product_id, product_name, unit_price,
                                         quantity, line_subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .bind(line.line_subtotal)
            .fetch_one(&mut *self.tx)
            .await?;

            lines.push(OrderLine {
                id: OrderLineId::new(line_id),
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_subtotal: line.line_subtotal,
            });
        }

        Ok(Order {
            id: order_id,
            user_id,
            status: OrderStatus::Pending,
            shipping_address: draft.shipping_address.clone(),
            payment_method: draft.payment_method,
            shipping_tier: draft.shipping_tier,
            lines,
            subtotal: draft.subtotal,
            tax: draft.tax,
            shipping_cost: draft.shipping_cost,
            total: draft.total,
            currency: draft.currency,
            created_at: inserted.created_at,
        })
    }

    async fn clear_cart(&mut self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM cart_lines cl
            USING carts c
            WHERE cl.cart_id = c.id AND c.user_id = $1
            ",
        )
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
