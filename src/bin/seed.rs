use storefront_api::{config::AppConfig, db::create_pool, services::auth_service};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

    let admin_id = ensure_admin(&pool, &admin_email, &admin_password).await?;
    seed_categories(&pool).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = auth_service::hash_password(password)?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO admin_users (id, email, password_hash, role)
        VALUES ($1, $2, $3, 'admin')
        ON CONFLICT (email) DO UPDATE SET password_hash = EXCLUDED.password_hash
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let admin_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM admin_users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured admin {email}");
    Ok(admin_id)
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = vec![
        ("new", "New Arrivals"),
        ("shirts", "Tees & Shirts"),
        ("hoodies", "Hoodies"),
        ("bottoms", "Bottoms"),
        ("womens", "Womens"),
        ("sale", "Sale"),
    ];

    for (slug, name) in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, slug, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(name)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "GG-TEE-001",
            "Flame Logo Tee",
            "Heavyweight cotton tee with front flame print",
            350000_i64,
            "shirts",
        ),
        (
            "GG-HOOD-001",
            "Glo Puff Hoodie",
            "Oversized fleece hoodie with puff print",
            890000_i64,
            "hoodies",
        ),
        (
            "GG-PANT-001",
            "Cargo Flare Pants",
            "Washed cargo pants with flared leg",
            720000_i64,
            "bottoms",
        ),
    ];

    for (sku, title, description, price_cents, category_slug) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, title, description, price_cents, currency, stock, is_active, category_id, images, attributes)
            SELECT $1, $2, $3, $4, $5, 'USD', 25, true, c.id, $7, $8
            FROM categories c
            WHERE c.slug = $6
              AND NOT EXISTS (SELECT 1 FROM products p WHERE p.sku = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sku)
        .bind(title)
        .bind(description)
        .bind(price_cents)
        .bind(category_slug)
        .bind(serde_json::json!([]))
        .bind(serde_json::json!({ "sizes": ["XS", "S", "M", "L", "XL"] }))
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
