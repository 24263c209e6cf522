use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{CreateOrderRequest, CreateOrderResponse, OrderList, OrderWithItems, UpdateOrderRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{AdminUser, Category, Order, OrderItem, Product},
    response::{ApiResponse, Meta},
    routes::{admin, auth, categories, health, orders, params, products as product_routes},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        product_routes::list_products,
        product_routes::get_product,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        admin::list_products_admin,
        admin::get_product_admin,
        admin::create_product,
        admin::update_product,
        admin::delete_product
    ),
    components(
        schemas(
            AdminUser,
            Category,
            Product,
            Order,
            OrderItem,
            LoginRequest,
            LoginResponse,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateOrderRequest,
            CreateOrderResponse,
            UpdateOrderRequest,
            OrderList,
            OrderWithItems,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<LoginResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Admin authentication"),
        (name = "Products", description = "Public storefront catalog"),
        (name = "Orders", description = "Checkout and order management"),
        (name = "Admin", description = "Back-office category and product management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
