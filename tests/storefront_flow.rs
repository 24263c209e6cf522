use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Statement};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    dto::{
        auth::LoginRequest,
        categories::CreateCategoryRequest,
        orders::{CreateOrderRequest, OrderItemInput, UpdateOrderRequest},
        products::{CreateProductRequest, UpdateProductRequest},
    },
    entity::customers::{Column as CustCol, Entity as Customers},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{OrderListQuery, Pagination, ProductQuery, SortOrder},
    services::{auth_service, category_service, order_service, product_service},
    state::AppState,
};
use uuid::Uuid;

// Full storefront flow: admin logs in and sets up the catalog, an anonymous
// customer checks out, the admin works the order, then catalog teardown.
#[tokio::test]
async fn catalog_checkout_and_admin_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;

    // Provision the admin the way the seed binary does.
    let password_hash = auth_service::hash_password("admin123")?;
    let admin_id = Uuid::new_v4();
    sqlx::query("INSERT INTO admin_users (id, email, password_hash, role) VALUES ($1, $2, $3, 'admin')")
        .bind(admin_id)
        .bind("admin@example.com")
        .bind(&password_hash)
        .execute(&state.pool)
        .await?;

    // Wrong password must fail without revealing which factor was wrong.
    let err = auth_service::login(
        &state,
        LoginRequest {
            email: "admin@example.com".into(),
            password: "wrong".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    assert_eq!(err.to_string(), "Invalid credentials");

    let login = auth_service::login(
        &state,
        LoginRequest {
            email: "admin@example.com".into(),
            password: "admin123".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(login.user.id, admin_id);
    assert_eq!(login.user.role, "admin");
    assert!(!login.token.is_empty());

    let admin = AuthUser {
        user_id: admin_id,
        email: "admin@example.com".into(),
        role: "admin".into(),
    };

    // A non-admin token is rejected at the service gate.
    let viewer = AuthUser {
        user_id: Uuid::new_v4(),
        email: "viewer@example.com".into(),
        role: "viewer".into(),
    };
    let err = order_service::list_orders(&state, &viewer, order_query(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Catalog setup.
    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            slug: "shirts".into(),
            name: "Tees & Shirts".into(),
        },
    )
    .await?
    .data
    .unwrap();

    let err = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            slug: "shirts".into(),
            name: "Duplicate".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            sku: Some("GG-TEE-001".into()),
            title: "Flame Logo Tee".into(),
            description: Some("Heavyweight cotton tee".into()),
            price_cents: None,
            price_rub: Some(3500.0),
            currency: None,
            stock: Some(25),
            is_active: None,
            category_id: Some(category.id),
            images: Some(vec!["https://cdn.example.com/tee-front.jpg".into()]),
            attributes: Some(serde_json::json!({ "sizes": ["S", "M", "L"] })),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(product.price_cents, 350000);
    assert!(product.is_active);

    // Storefront sees it when filtering by the category slug.
    let listed = product_service::list_products(&state, product_query(Some("shirts")))
        .await?
        .data
        .unwrap();
    assert!(listed.items.iter().any(|p| p.id == product.id));

    let listed = product_service::list_products(&state, product_query(Some("hoodies")))
        .await?
        .data
        .unwrap();
    assert!(listed.items.is_empty());

    // Partial update touches only the supplied fields.
    let updated = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            sku: None,
            title: None,
            description: None,
            price_cents: Some(299000),
            price_rub: None,
            currency: None,
            stock: None,
            is_active: None,
            category_id: None,
            images: None,
            attributes: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.price_cents, 299000);
    assert_eq!(updated.description.as_deref(), Some("Heavyweight cotton tee"));
    assert_eq!(updated.images, vec!["https://cdn.example.com/tee-front.jpg"]);

    // Anonymous checkout: two line items, one with defaulted price/quantity.
    let created = order_service::create_order(
        &state,
        CreateOrderRequest {
            customer_email: "a@b.com".into(),
            items: vec![
                OrderItemInput {
                    product_id: Some(product.id),
                    title: "Tee".into(),
                    sku: Some("GG-TEE-001".into()),
                    quantity: Some(2),
                    unit_price_cents: Some(500),
                    attributes: Some(serde_json::json!({ "size": "M" })),
                },
                OrderItemInput {
                    product_id: None,
                    title: "Sticker".into(),
                    sku: None,
                    quantity: None,
                    unit_price_cents: None,
                    attributes: None,
                },
            ],
            currency: None,
        },
    )
    .await?
    .data
    .unwrap();

    let fetched = order_service::get_order(&state, &admin, created.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.order.total_cents, 1000);
    assert_eq!(fetched.order.status, "pending");
    assert_eq!(fetched.order.customer_email.as_deref(), Some("a@b.com"));
    assert_eq!(fetched.items.len(), 2);
    let tee = fetched.items.iter().find(|i| i.title == "Tee").unwrap();
    assert_eq!(tee.quantity, 2);
    assert_eq!(tee.unit_price_cents, 500);
    let sticker = fetched.items.iter().find(|i| i.title == "Sticker").unwrap();
    assert_eq!(sticker.quantity, 1);
    assert_eq!(sticker.unit_price_cents, 0);

    // Second order for the same email reuses the customer row.
    order_service::create_order(
        &state,
        CreateOrderRequest {
            customer_email: "a@b.com".into(),
            items: vec![],
            currency: None,
        },
    )
    .await?;
    let customer_count = Customers::find()
        .filter(CustCol::Email.eq("a@b.com"))
        .count(&state.orm)
        .await?;
    assert_eq!(customer_count, 1);

    // A rejected order leaves nothing behind for that email.
    let err = order_service::create_order(
        &state,
        CreateOrderRequest {
            customer_email: "reject@b.com".into(),
            items: vec![OrderItemInput {
                product_id: None,
                title: "Bad".into(),
                sku: None,
                quantity: Some(1),
                unit_price_cents: Some(-500),
                attributes: None,
            }],
            currency: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let rejected_count = Customers::find()
        .filter(CustCol::Email.eq("reject@b.com"))
        .count(&state.orm)
        .await?;
    assert_eq!(rejected_count, 0);

    // Admin order management.
    let orders = order_service::list_orders(&state, &admin, order_query(Some("pending")))
        .await?
        .data
        .unwrap();
    assert!(orders.items.iter().any(|o| o.id == created.id));

    let err = order_service::update_order(
        &state,
        &admin,
        created.id,
        UpdateOrderRequest {
            status: Some("refunded".into()),
            meta: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let shipped = order_service::update_order(
        &state,
        &admin,
        created.id,
        UpdateOrderRequest {
            status: Some("shipped".into()),
            meta: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(shipped.status, "shipped");
    // Meta was omitted, so it kept its prior value.
    assert_eq!(shipped.meta, serde_json::json!({}));

    // Deletes are idempotent.
    order_service::delete_order(&state, &admin, created.id).await?;
    order_service::delete_order(&state, &admin, created.id).await?;

    // Deleting the category leaves the product in place, uncategorized.
    category_service::delete_category(&state, &admin, category.id).await?;
    category_service::delete_category(&state, &admin, category.id).await?;
    let orphaned = product_service::get_product_admin(&state, &admin, product.id)
        .await?
        .data
        .unwrap();
    assert_eq!(orphaned.category_id, None);

    // Deactivated products disappear from the storefront but not the back office.
    product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            sku: None,
            title: None,
            description: None,
            price_cents: None,
            price_rub: None,
            currency: None,
            stock: None,
            is_active: Some(false),
            category_id: None,
            images: None,
            attributes: None,
        },
    )
    .await?;
    let err = product_service::get_product(&state, product.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    product_service::get_product_admin(&state, &admin, product.id).await?;

    product_service::delete_product(&state, &admin, product.id).await?;
    product_service::delete_product(&state, &admin, product.id).await?;

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs.
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, customers, products, categories, audit_logs, admin_users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        jwt_secret: "test-secret".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
    };

    Ok(AppState { pool, orm, config })
}

fn product_query(category: Option<&str>) -> ProductQuery {
    ProductQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        q: None,
        category: category.map(String::from),
        sort_by: None,
        sort_order: Some(SortOrder::Desc),
    }
}

fn order_query(status: Option<&str>) -> OrderListQuery {
    OrderListQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        status: status.map(String::from),
        sort_order: None,
    }
}
