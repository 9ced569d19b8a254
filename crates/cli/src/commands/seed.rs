//! Catalog seeding command.
//!
//! Inserts a handful of sample products for local development, including one
//! with a discount window that is live for the next week. Seeding is
//! idempotent: products are keyed by name and re-runs skip existing rows.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::info;

use ceibo_core::CurrencyCode;
use ceibo_storefront::db;

/// Every seeded product is priced in pesos.
const CURRENCY: CurrencyCode = CurrencyCode::UYU;

/// Seed the catalog with sample products.
///
/// # Errors
///
/// Returns an error if the database URL is missing or an insert fails.
pub async fn products() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "STOREFRONT_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let samples: &[(&str, Decimal, i32)] = &[
        ("Yerba mate 1kg", Decimal::new(38_000, 2), 120),
        ("Termo acero 1L", Decimal::new(189_000, 2), 35),
        ("Mate de calabaza", Decimal::new(95_000, 2), 50),
        ("Bombilla alpaca", Decimal::new(62_000, 2), 80),
        ("Dulce de leche 500g", Decimal::new(21_500, 2), 200),
    ];

    let mut inserted = 0_u32;
    for (name, price, stock) in samples {
        let result = sqlx::query(
            r"
            INSERT INTO products (name, price, currency, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(name)
        .bind(price)
        .bind(CURRENCY.code())
        .bind(stock)
        .execute(&pool)
        .await?;

        inserted += u32::try_from(result.rows_affected()).unwrap_or(0);
    }

    // One product with a live discount so the pricing path is visible
    let now = Utc::now();
    let result = sqlx::query(
        r"
        INSERT INTO products (name, price, currency, stock,
                              discount_price, discount_starts_at, discount_ends_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (name) DO NOTHING
        ",
    )
    .bind("Poncho de lana")
    .bind(Decimal::new(250_000, 2))
    .bind(CURRENCY.code())
    .bind(25)
    .bind(Decimal::new(200_000, 2))
    .bind(now - Duration::days(1))
    .bind(now + Duration::days(7))
    .execute(&pool)
    .await?;
    inserted += u32::try_from(result.rows_affected()).unwrap_or(0);

    info!("Seeding complete! {inserted} products inserted");

    Ok(())
}
