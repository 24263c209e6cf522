use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CreateOrderRequest, CreateOrderResponse, OrderItemInput, OrderList, OrderWithItems,
        UpdateOrderRequest,
    },
    entity::{
        customers::{ActiveModel as CustomerActive, Column as CustCol, Entity as Customers},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

const VALID_STATUSES: [&str; 5] = ["pending", "paid", "shipped", "completed", "cancelled"];

pub fn validate_order_status(status: &str) -> AppResult<()> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid order status".into()))
    }
}

/// Line totals over the supplied items: a missing unit price counts as
/// zero, a missing quantity as one.
pub fn compute_total(items: &[OrderItemInput]) -> i64 {
    items
        .iter()
        .map(|it| it.unit_price_cents.unwrap_or(0) * i64::from(it.quantity.unwrap_or(1)))
        .sum()
}

/// Anonymous checkout. Customer upsert, order insert and item inserts run
/// in one transaction; a failure in any step rolls back all of them.
pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<CreateOrderResponse>> {
    let customer_email = payload.customer_email.trim().to_string();
    if customer_email.is_empty() {
        return Err(AppError::Validation("customer_email is required".into()));
    }
    for item in &payload.items {
        if item.title.trim().is_empty() {
            return Err(AppError::Validation("item title is required".into()));
        }
        if item.unit_price_cents.is_some_and(|p| p < 0) {
            return Err(AppError::Validation(
                "unit_price_cents must be non-negative".into(),
            ));
        }
        if item.quantity.is_some_and(|q| q < 1) {
            return Err(AppError::Validation("quantity must be at least 1".into()));
        }
    }

    let currency = payload.currency.clone().unwrap_or_else(|| "USD".to_string());
    let total_cents = compute_total(&payload.items);

    let txn = state.orm.begin().await?;

    let existing = Customers::find()
        .filter(CustCol::Email.eq(customer_email.as_str()))
        .one(&txn)
        .await?;
    let customer_id = match existing {
        Some(c) => c.id,
        None => {
            CustomerActive {
                id: Set(Uuid::new_v4()),
                email: Set(customer_email.clone()),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
            .id
        }
    };

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        status: Set("pending".into()),
        total_cents: Set(total_cents),
        currency: Set(currency.clone()),
        meta: Set(serde_json::json!({})),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for item in &payload.items {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            title: Set(item.title.clone()),
            sku: Set(item.sku.clone()),
            quantity: Set(item.quantity.unwrap_or(1)),
            unit_price_cents: Set(item.unit_price_cents.unwrap_or(0)),
            currency: Set(currency.clone()),
            attributes: Set(item.attributes.clone().unwrap_or_else(|| serde_json::json!({}))),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_cents": total_cents })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        CreateOrderResponse { id: order.id },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .find_also_related(Customers)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, customer)| order_from_entity(order, customer.map(|c| c.email)))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .find_also_related(Customers)
        .one(&state.orm)
        .await?;
    let (order, customer) = match order {
        Some(pair) => pair,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: order_from_entity(order, customer.map(|c| c.email)),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Status and meta follow coalesce semantics: omitted fields keep their
/// prior values.
pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    if let Some(status) = payload.status {
        validate_order_status(&status)?;
        active.status = Set(status);
    }
    if let Some(meta) = payload.meta {
        active.meta = Set(meta);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order, None),
        Some(Meta::empty()),
    ))
}

/// Idempotent: deleting an absent id is a no-op. Items go with the order
/// via the cascade.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    Orders::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
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

fn order_from_entity(model: OrderModel, customer_email: Option<String>) -> Order {
    Order {
        id: model.id,
        customer_id: model.customer_id,
        customer_email,
        status: model.status,
        total_cents: model.total_cents,
        currency: model.currency,
        meta: model.meta,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        title: model.title,
        sku: model.sku,
        quantity: model.quantity,
        unit_price_cents: model.unit_price_cents,
        currency: model.currency,
        attributes: model.attributes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
