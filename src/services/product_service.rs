use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::categories,
    entity::products::{self, ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

/// Storefront listing: active products only, optional category slug
/// filter and text search.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let finder = product_finder(&query, true);
    paginate(state, finder, &query).await
}

/// Back-office listing: includes inactive products.
pub async fn list_products_admin(
    state: &AppState,
    user: &AuthUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let finder = product_finder(&query, false);
    paginate(state, finder, &query).await
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .map(product_from_entity);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn get_product_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    let price_cents = price_from_request(payload.price_cents, payload.price_rub)?;
    let stock = payload.stock.unwrap_or(0);
    if stock < 0 {
        return Err(AppError::Validation("stock must be non-negative".into()));
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(payload.sku),
        title: Set(title),
        description: Set(payload.description),
        price_cents: Set(price_cents),
        currency: Set(payload.currency.unwrap_or_else(|| "USD".to_string())),
        stock: Set(stock),
        is_active: Set(payload.is_active.unwrap_or(true)),
        category_id: Set(payload.category_id),
        images: Set(serde_json::json!(payload.images.unwrap_or_default())),
        attributes: Set(payload.attributes.unwrap_or_else(|| serde_json::json!({}))),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Merge update: fields absent from the payload keep their prior values.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(sku) = payload.sku {
        active.sku = Set(Some(sku));
    }
    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if payload.price_cents.is_some() || payload.price_rub.is_some() {
        active.price_cents = Set(price_from_request(payload.price_cents, payload.price_rub)?);
    }
    if let Some(currency) = payload.currency {
        active.currency = Set(currency);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::Validation("stock must be non-negative".into()));
        }
        active.stock = Set(stock);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(images) = payload.images {
        active.images = Set(serde_json::json!(images));
    }
    if let Some(attributes) = payload.attributes {
        active.attributes = Set(attributes);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Idempotent: deleting an absent id is a no-op.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    Products::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn price_from_request(price_cents: Option<i64>, price_rub: Option<f64>) -> AppResult<i64> {
    let cents = match (price_cents, price_rub) {
        (Some(cents), _) => cents,
        (None, Some(rub)) => {
            if !rub.is_finite() {
                return Err(AppError::Validation("price must be a number".into()));
            }
            (rub * 100.0).round() as i64
        }
        (None, None) => return Err(AppError::Validation("price is required".into())),
    };
    if cents < 0 {
        return Err(AppError::Validation("price must be non-negative".into()));
    }
    Ok(cents)
}

fn product_finder(query: &ProductQuery, only_active: bool) -> Select<Products> {
    let mut condition = Condition::all();
    if only_active {
        condition = condition.add(Column::IsActive.eq(true));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    let mut finder = Products::find().filter(condition);

    if let Some(slug) = query.category.as_ref().filter(|s| !s.is_empty()) {
        finder = finder
            .join(JoinType::InnerJoin, products::Relation::Categories.def())
            .filter(categories::Column::Slug.eq(slug.clone()));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(match sort_by {
        ProductSortBy::CreatedAt => SortOrder::Desc,
        _ => SortOrder::Asc,
    });
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::PriceCents,
        ProductSortBy::Title => Column::Title,
    };
    match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    }
}

async fn paginate(
    state: &AppState,
    finder: Select<Products>,
    query: &ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        sku: model.sku,
        title: model.title,
        description: model.description,
        price_cents: model.price_cents,
        currency: model.currency,
        stock: model.stock,
        is_active: model.is_active,
        category_id: model.category_id,
        images: serde_json::from_value(model.images).unwrap_or_default(),
        attributes: model.attributes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
