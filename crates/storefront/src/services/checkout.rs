//! Checkout: turning a cart into an immutable order, atomically.
//!
//! The flow is: validate caller input (no storage touched on failure), then
//! inside one storage transaction re-read and lock the cart lines, resolve
//! prices at this instant, persist the order with snapshot lines, clear the
//! cart, commit. A failure anywhere after `begin` rolls the whole thing
//! back: there is never an order without its lines, nor a cleared cart
//! without its order.
//!
//! The storage seam is the [`CheckoutStore`]/[`CheckoutTx`] pair so the full
//! flow runs identically against `PostgreSQL` and against the in-memory
//! store the tests use.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use ceibo_core::pricing::price_cart;
use ceibo_core::validation::{ValidationIssue, validate_checkout};
use ceibo_core::{
    CartLine, Order, OrderDraft, Payment, Price, Product, ProductId, ShippingAddress,
    ShippingTier, UserId,
};

use crate::db::RepositoryError;

/// Caller-supplied checkout input.
///
/// The shipping tier arrives as text and is parsed here so an unknown tier
/// is reported alongside the other validation issues.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub payment: Payment,
    pub shipping_tier: String,
}

/// Errors from `place_order`.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Precondition failures; nothing was mutated.
    #[error("checkout validation failed ({} issue(s))", .0.len())]
    Validation(Vec<ValidationIssue>),

    /// A cart line references a product that no longer exists.
    #[error("product {0} no longer exists")]
    ProductMissing(ProductId),

    /// Storage failure; the transaction was rolled back.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Storage capable of opening a checkout transaction.
pub trait CheckoutStore {
    type Tx: CheckoutTx;

    /// Begin a transaction. Dropping the returned value without calling
    /// [`CheckoutTx::commit`] must roll back every change made through it.
    async fn begin(&self) -> Result<Self::Tx, RepositoryError>;
}

/// One in-flight checkout transaction.
pub trait CheckoutTx {
    /// Re-read the user's current cart lines, locked against concurrent
    /// checkouts until commit or rollback.
    async fn cart_lines_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<CartLine>, RepositoryError>;

    /// Load the products referenced by the cart.
    async fn products_by_ids(
        &mut self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Persist the order and its lines, returning the stored order.
    async fn insert_order(
        &mut self,
        user_id: UserId,
        draft: &OrderDraft,
    ) -> Result<Order, RepositoryError>;

    /// Empty the user's cart (the cart row itself stays).
    async fn clear_cart(&mut self, user_id: UserId) -> Result<(), RepositoryError>;

    /// Commit every change made through this transaction.
    async fn commit(self) -> Result<(), RepositoryError>;
}

/// Create an order from the user's server-side cart.
///
/// Prices are resolved from the catalog at commit time; whatever the client
/// displayed earlier is irrelevant. The cart is re-read inside the
/// transaction, so a concurrent checkout that already emptied it fails
/// validation here instead of producing a second order.
///
/// # Errors
///
/// - [`CheckoutError::Validation`] for bad input or an empty cart - no
///   mutation happened.
/// - [`CheckoutError::ProductMissing`] if a cart line references a deleted
///   product - rolled back.
/// - [`CheckoutError::Repository`] for storage failures - rolled back.
pub async fn place_order<S: CheckoutStore>(
    store: &S,
    user_id: UserId,
    request: CheckoutRequest,
    tax_rate: Decimal,
    now: DateTime<Utc>,
) -> Result<Order, CheckoutError> {
    let mut issues = validate_checkout(&request.shipping_address, &request.payment);

    let tier = match request.shipping_tier.parse::<ShippingTier>() {
        Ok(tier) => tier,
        Err(message) => {
            issues.push(ValidationIssue::new("shipping_tier", message));
            return Err(CheckoutError::Validation(issues));
        }
    };

    if !issues.is_empty() {
        return Err(CheckoutError::Validation(issues));
    }

    let mut tx = store.begin().await?;

    // The caller's view of the cart is not trusted; re-read under lock.
    let lines = tx.cart_lines_for_update(user_id).await?;
    if lines.is_empty() {
        return Err(CheckoutError::Validation(vec![ValidationIssue::new(
            "cart",
            "cart is empty",
        )]));
    }

    let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
    let products: HashMap<ProductId, Product> = tx
        .products_by_ids(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut items: Vec<(CartLine, Product)> = Vec::with_capacity(lines.len());
    for line in lines {
        let product = products
            .get(&line.product_id)
            .cloned()
            .ok_or(CheckoutError::ProductMissing(line.product_id))?;
        items.push((line, product));
    }

    let priced = price_cart(&items, tier, tax_rate, now);

    let draft = OrderDraft {
        shipping_address: request.shipping_address,
        payment_method: request.payment.method(),
        shipping_tier: tier,
        lines: priced.lines,
        subtotal: priced.subtotal,
        tax: priced.tax,
        shipping_cost: priced.shipping_cost,
        total: priced.total,
        currency: priced.currency,
    };

    let order = tx.insert_order(user_id, &draft).await?;

    // Clearing the cart is the last write inside the same transaction as
    // the order insert.
    tx.clear_cart(user_id).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user_id,
        total = %Price::new(order.total, order.currency),
        "order placed"
    );

    Ok(order)
}
