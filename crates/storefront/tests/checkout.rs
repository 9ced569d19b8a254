//! Checkout flow tests over an in-memory store.
//!
//! The store implements the same transaction contract as the `PostgreSQL`
//! one: a single lock held for the transaction's lifetime serializes
//! concurrent checkouts, and writes are staged until commit so dropping the
//! transaction discards them.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use ceibo_core::{
    CartLine, DiscountWindow, Order, OrderDraft, OrderLine, OrderLineId, OrderId, OrderStatus,
    Payment, Product, ProductId, ShippingAddress, UserId,
};
use ceibo_storefront::db::RepositoryError;
use ceibo_storefront::services::checkout::{
    CheckoutError, CheckoutRequest, CheckoutStore, CheckoutTx, place_order,
};

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Default)]
struct StoreState {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Vec<CartLine>>,
    orders: Vec<Order>,
    next_order_id: i32,
}

#[derive(Clone, Default)]
struct MemStore {
    state: Arc<Mutex<StoreState>>,
}

struct MemTx {
    guard: OwnedMutexGuard<StoreState>,
    staged_orders: Vec<Order>,
    staged_clears: Vec<UserId>,
}

impl CheckoutStore for MemStore {
    type Tx = MemTx;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        Ok(MemTx {
            guard: Arc::clone(&self.state).lock_owned().await,
            staged_orders: Vec::new(),
            staged_clears: Vec::new(),
        })
    }
}

impl CheckoutTx for MemTx {
    async fn cart_lines_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        Ok(self.guard.carts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn products_by_ids(
        &mut self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.guard.products.get(id).cloned())
            .collect())
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        draft: &OrderDraft,
    ) -> Result<Order, RepositoryError> {
        self.guard.next_order_id += 1;
        let order_id = self.guard.next_order_id;

        let lines = draft
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| OrderLine {
                id: OrderLineId::new(order_id * 100 + i32::try_from(i).unwrap()),
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_subtotal: line.line_subtotal,
            })
            .collect();

        let order = Order {
            id: OrderId::new(order_id),
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
            created_at: Utc::now(),
        };

        self.staged_orders.push(order.clone());
        Ok(order)
    }

    async fn clear_cart(&mut self, user_id: UserId) -> Result<(), RepositoryError> {
        self.staged_clears.push(user_id);
        Ok(())
    }

    async fn commit(mut self) -> Result<(), RepositoryError> {
        let orders = std::mem::take(&mut self.staged_orders);
        let clears = std::mem::take(&mut self.staged_clears);

        for order in orders {
            self.guard.orders.push(order);
        }
        for user_id in clears {
            self.guard.carts.insert(user_id, Vec::new());
        }

        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

const USER: UserId = UserId::new(1);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

fn tax_rate() -> Decimal {
    Decimal::new(22, 2)
}

fn product(id: i32, name: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        price,
        currency: ceibo_core::CurrencyCode::default(),
        stock: 100,
        discount: None,
    }
}

fn discounted(id: i32, name: &str, price: Decimal, discounted_price: Decimal) -> Product {
    Product {
        discount: Some(DiscountWindow {
            starts_at: now() - Duration::days(1),
            ends_at: now() + Duration::days(1),
            discounted_price,
        }),
        ..product(id, name, price)
    }
}

async fn store_with(products: Vec<Product>, cart: Vec<CartLine>) -> MemStore {
    let store = MemStore::default();
    {
        let mut state = store.state.lock().await;
        for p in products {
            state.products.insert(p.id, p);
        }
        state.carts.insert(USER, cart);
    }
    store
}

fn request() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: ShippingAddress {
            region: "Montevideo".to_owned(),
            locality: "Montevideo".to_owned(),
            street: "18 de Julio".to_owned(),
            number: "1234".to_owned(),
            corner: Some("Ejido".to_owned()),
        },
        payment: Payment::Card {
            number: "4111111111111111".to_owned(),
            expiry: "12/27".to_owned(),
            cvv: "123".to_owned(),
        },
        shipping_tier: "express".to_owned(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_totals_for_express_order() {
    // 4 x 500.00 = 2000.00; tax 22% = 440.00; express 7% = 140.00
    let store = store_with(
        vec![product(10, "Termo", Decimal::new(500_00, 2))],
        vec![CartLine::new(ProductId::new(10), 4)],
    )
    .await;

    let order = place_order(&store, USER, request(), tax_rate(), now())
        .await
        .unwrap();

    assert_eq!(order.subtotal, Decimal::new(2000_00, 2));
    assert_eq!(order.tax, Decimal::new(440_00, 2));
    assert_eq!(order.shipping_cost, Decimal::new(140_00, 2));
    assert_eq!(order.total, Decimal::new(2580_00, 2));
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_discount_captured_in_order_lines() {
    // 2 x 400.00 (discounted from 500.00) = 800.00; tax 176.00; standard 5% = 40.00
    let store = store_with(
        vec![discounted(
            11,
            "Mate",
            Decimal::new(500_00, 2),
            Decimal::new(400_00, 2),
        )],
        vec![CartLine::new(ProductId::new(11), 2)],
    )
    .await;

    let mut req = request();
    req.shipping_tier = "standard".to_owned();

    let order = place_order(&store, USER, req, tax_rate(), now()).await.unwrap();

    assert_eq!(order.subtotal, Decimal::new(800_00, 2));
    assert_eq!(order.tax, Decimal::new(176_00, 2));
    assert_eq!(order.shipping_cost, Decimal::new(40_00, 2));
    assert_eq!(order.total, Decimal::new(1016_00, 2));

    let line = &order.lines[0];
    assert_eq!(line.unit_price, Decimal::new(400_00, 2));
    assert_eq!(line.product_name, "Mate");
}

#[tokio::test]
async fn test_expired_discount_charges_base_price() {
    let mut p = discounted(12, "Bombilla", Decimal::new(300_00, 2), Decimal::new(200_00, 2));
    p.discount = Some(DiscountWindow {
        starts_at: now() - Duration::days(10),
        ends_at: now() - Duration::days(5),
        discounted_price: Decimal::new(200_00, 2),
    });

    let store = store_with(vec![p], vec![CartLine::new(ProductId::new(12), 1)]).await;

    let order = place_order(&store, USER, request(), tax_rate(), now())
        .await
        .unwrap();

    assert_eq!(order.lines[0].unit_price, Decimal::new(300_00, 2));
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let store = store_with(vec![product(10, "Termo", Decimal::ONE)], vec![]).await;

    let err = place_order(&store, USER, request(), tax_rate(), now())
        .await
        .unwrap_err();

    match err {
        CheckoutError::Validation(issues) => {
            assert!(issues.iter().any(|i| i.field == "cart"));
        }
        other => panic!("expected validation error, got {other}"),
    }

    assert!(store.state.lock().await.orders.is_empty());
}

#[tokio::test]
async fn test_invalid_payment_leaves_cart_untouched() {
    let store = store_with(
        vec![product(10, "Termo", Decimal::new(500_00, 2))],
        vec![CartLine::new(ProductId::new(10), 1)],
    )
    .await;

    let mut req = request();
    req.payment = Payment::Card {
        number: "411".to_owned(),
        expiry: "13/27".to_owned(),
        cvv: "1".to_owned(),
    };

    let err = place_order(&store, USER, req, tax_rate(), now())
        .await
        .unwrap_err();

    match err {
        CheckoutError::Validation(issues) => assert_eq!(issues.len(), 3),
        other => panic!("expected validation error, got {other}"),
    }

    let state = store.state.lock().await;
    assert!(state.orders.is_empty());
    assert_eq!(state.carts.get(&USER).unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_shipping_tier_is_rejected() {
    let store = store_with(
        vec![product(10, "Termo", Decimal::new(500_00, 2))],
        vec![CartLine::new(ProductId::new(10), 1)],
    )
    .await;

    let mut req = request();
    req.shipping_tier = "teleport".to_owned();

    let err = place_order(&store, USER, req, tax_rate(), now())
        .await
        .unwrap_err();

    match err {
        CheckoutError::Validation(issues) => {
            assert!(issues.iter().any(|i| i.field == "shipping_tier"));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[tokio::test]
async fn test_missing_product_rolls_back() {
    // Cart references product 99 which is not in the catalog
    let store = store_with(
        vec![product(10, "Termo", Decimal::new(500_00, 2))],
        vec![
            CartLine::new(ProductId::new(10), 1),
            CartLine::new(ProductId::new(99), 2),
        ],
    )
    .await;

    let err = place_order(&store, USER, request(), tax_rate(), now())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::ProductMissing(id) if id == ProductId::new(99)
    ));

    let state = store.state.lock().await;
    assert!(state.orders.is_empty());
    assert_eq!(state.carts.get(&USER).unwrap().len(), 2);
}

#[tokio::test]
async fn test_cash_payment_needs_no_card_details() {
    let store = store_with(
        vec![product(10, "Termo", Decimal::new(500_00, 2))],
        vec![CartLine::new(ProductId::new(10), 1)],
    )
    .await;

    let mut req = request();
    req.payment = Payment::Cash;

    let order = place_order(&store, USER, req, tax_rate(), now()).await.unwrap();
    assert_eq!(order.payment_method, ceibo_core::PaymentMethod::Cash);
}

#[tokio::test]
async fn test_successful_checkout_clears_cart_and_stores_order() {
    let store = store_with(
        vec![product(10, "Termo", Decimal::new(500_00, 2))],
        vec![CartLine::new(ProductId::new(10), 2)],
    )
    .await;

    let order = place_order(&store, USER, request(), tax_rate(), now())
        .await
        .unwrap();

    let state = store.state.lock().await;
    assert_eq!(state.orders.len(), 1);
    assert_eq!(state.orders[0].id, order.id);
    assert!(state.carts.get(&USER).unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_checkouts_produce_one_order() {
    let store = store_with(
        vec![product(10, "Termo", Decimal::new(500_00, 2))],
        vec![CartLine::new(ProductId::new(10), 2)],
    )
    .await;

    let (a, b) = tokio::join!(
        place_order(&store, USER, request(), tax_rate(), now()),
        place_order(&store, USER, request(), tax_rate(), now()),
    );

    // Exactly one wins; the loser sees the already-emptied cart
    let (ok, err) = match (a, b) {
        (Ok(order), Err(e)) | (Err(e), Ok(order)) => (order, e),
        (Ok(_), Ok(_)) => panic!("both checkouts succeeded"),
        (Err(e1), Err(e2)) => panic!("both checkouts failed: {e1} / {e2}"),
    };

    assert_eq!(ok.subtotal, Decimal::new(1000_00, 2));
    match err {
        CheckoutError::Validation(issues) => {
            assert!(issues.iter().any(|i| i.field == "cart"));
        }
        other => panic!("expected empty-cart validation, got {other}"),
    }

    assert_eq!(store.state.lock().await.orders.len(), 1);
}
