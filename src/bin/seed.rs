use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use storefront_admin_api::{
    config::AppConfig,
    db::{create_orm_conn, raw_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = raw_pool(&orm);

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin123", "admin").await?;
    let customer_id = ensure_customer(&pool, "alice", "alice@example.com", "secret123").await?;
    let apparel = ensure_category(&pool, "Apparel", "apparel", None).await?;
    let hoodies = ensure_category(&pool, "Hoodies", "hoodies", Some(apparel)).await?;
    let kitchen = ensure_category(&pool, "Kitchen", "kitchen", None).await?;
    seed_products(&pool, &[hoodies, kitchen, apparel]).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

fn hash(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (name, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(hash(password)?)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn ensure_customer(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO customers (username, email, password, address, phone_number)
        VALUES ($1, $2, $3, '1 Main St, Springfield', '555-0100')
        ON CONFLICT (username) DO UPDATE SET email = EXCLUDED.email
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(hash(password)?)
    .fetch_one(pool)
    .await?;

    println!("Ensured customer {username}");
    Ok(id)
}

async fn ensure_category(
    pool: &sqlx::PgPool,
    name: &str,
    slug: &str,
    parent_id: Option<i64>,
) -> anyhow::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO categories (name, slug, parent_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(slug)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool, categories: &[i64]) -> anyhow::Result<()> {
    let products = [
        ("Axum Hoodie", "Warm hoodie for Rustaceans", "55.00", 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", "12.00", 100),
        ("Rust Sticker Pack", "Decorate your laptop", "5.00", 200),
        ("Widget", "A general purpose widget", "9.99", 10),
    ];

    for (index, (title, description, price, stock)) in products.into_iter().enumerate() {
        let category_id = categories.get(index % categories.len().max(1)).copied();
        sqlx::query(
            r#"
            INSERT INTO products (title, description, price, stock_quantity, category_id, active, status)
            SELECT $1, $2, $3::numeric, $4, $5, TRUE, TRUE
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE title = $1)
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(stock)
        .bind(category_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
