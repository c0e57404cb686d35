#![allow(dead_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use storefront_admin_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{customers::CreateCustomerRequest, products::CreateProductRequest},
    entity::{Products, products::Model as ProductModel},
    services::{customer_service, product_service},
    state::AppState,
};

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: JWT_SECRET.into(),
        order_notify_email: "orders@example.com".into(),
        cache_enabled: false,
        cache_ttl_secs: 60,
    }
}

/// Connected and migrated state, or `None` when no database is configured.
pub async fn test_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    Ok(Some(AppState::new(orm, test_config(database_url))))
}

/// Collision-free name so runs against a shared database never clash.
pub fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{prefix}_{nanos}")
}

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub async fn create_customer(state: &AppState, prefix: &str) -> anyhow::Result<i64> {
    let username = unique(prefix);
    let resp = customer_service::create_customer(
        state,
        CreateCustomerRequest {
            email: format!("{username}@example.com"),
            username,
            password: "secret123".into(),
            address: Some("1 Main St".into()),
            phone_number: None,
        },
    )
    .await?;
    Ok(resp.data.expect("customer").id)
}

pub async fn create_product(
    state: &AppState,
    title: &str,
    price: Decimal,
    stock: i32,
) -> anyhow::Result<i64> {
    let resp = product_service::create_product(
        state,
        CreateProductRequest {
            title: unique(title),
            description: String::new(),
            image: String::new(),
            price,
            sales_off: None,
            low_price: None,
            stock_quantity: stock,
            category_id: None,
            active: true,
            status: true,
        },
    )
    .await?;
    Ok(resp.data.expect("product").id)
}

pub async fn product(state: &AppState, id: i64) -> anyhow::Result<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} missing"))
}
