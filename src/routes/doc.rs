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
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        categories::CategoryRequest,
        companies::CompanyRequest,
        customers::{CreateCustomerRequest, UpdateCustomerRequest},
        dashboard::{DashboardMetrics, RevenuePoint},
        order_details::OrderDetailRequest,
        order_history::OrderHistoryRequest,
        orders::{LineItemRequest, OrderRequest},
        posts::{PostRequest, PostStats, PostStatus},
        products::{CreateProductRequest, UpdateProductRequest},
    },
    models::{
        CategoryResource, CompanyResource, CustomerResource, OrderDetailResource,
        OrderHistoryResource, OrderResource, PostResource, ProductResource, ProductSummary,
        UserResource, UserSummary,
    },
    response::{ApiResponse, Meta},
    routes::{
        auth, categories, companies, customers, dashboard, health, order_details, order_history,
        orders, params, posts, products,
    },
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
        auth::register,
        auth::login,
        auth::me,
        customers::list_customers,
        customers::create_customer,
        customers::get_customer,
        customers::update_customer,
        customers::delete_customer,
        customers::export_csv,
        customers::export_pdf,
        companies::list_companies,
        companies::create_company,
        companies::get_company,
        companies::update_company,
        companies::delete_company,
        categories::list_categories,
        categories::root_categories,
        categories::create_category,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        orders::export_order_pdf,
        orders::revenue_analytics,
        order_details::list_order_details,
        order_details::create_order_detail,
        order_details::get_order_detail,
        order_details::update_order_detail,
        order_details::delete_order_detail,
        order_history::list_order_history,
        order_history::create_order_history,
        order_history::get_order_history,
        order_history::update_order_history,
        order_history::delete_order_history,
        posts::list_posts,
        posts::my_posts,
        posts::post_stats,
        posts::create_post,
        posts::get_post,
        posts::update_post,
        posts::delete_post,
        posts::publish_post,
        posts::archive_post,
        dashboard::metrics
    ),
    components(
        schemas(
            UserResource,
            UserSummary,
            CompanyResource,
            CustomerResource,
            CategoryResource,
            ProductResource,
            ProductSummary,
            OrderResource,
            OrderDetailResource,
            OrderHistoryResource,
            PostResource,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateCustomerRequest,
            UpdateCustomerRequest,
            CompanyRequest,
            CategoryRequest,
            CreateProductRequest,
            UpdateProductRequest,
            OrderRequest,
            LineItemRequest,
            OrderDetailRequest,
            OrderHistoryRequest,
            PostRequest,
            PostStatus,
            PostStats,
            DashboardMetrics,
            RevenuePoint,
            params::Pagination,
            params::RevenueFilter,
            Meta,
            ApiResponse<OrderResource>,
            ApiResponse<Vec<OrderResource>>,
            ApiResponse<PostResource>,
            ApiResponse<Vec<PostResource>>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and build identity"),
        (name = "Auth", description = "Admin user registration and login"),
        (name = "Customers", description = "Customer endpoints and exports"),
        (name = "Companies", description = "Company endpoints"),
        (name = "Categories", description = "Category tree endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Orders", description = "Order placement, analytics and exports"),
        (name = "Order details", description = "Order line endpoints"),
        (name = "Order history", description = "Order history endpoints"),
        (name = "Posts", description = "Blog post endpoints"),
        (name = "Dashboard", description = "Dashboard metrics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_resource_is_documented() {
        let openapi = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/customers/export/csv",
            "/api/orders/revenue-analytics",
            "/api/order-history/{id}",
            "/api/posts/{id}/publish",
            "/api/categories/roots",
            "/api/dashboard/metrics",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
