use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

/// Price is accepted either as minor units (`price_cents`) or as the
/// legacy major-unit form (`price_rub`) still sent by the admin UI.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub sku: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub price_rub: Option<f64>,
    pub currency: Option<String>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub attributes: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub price_rub: Option<f64>,
    pub currency: Option<String>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub attributes: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
