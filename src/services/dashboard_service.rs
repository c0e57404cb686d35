use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::{
    dto::dashboard::DashboardMetrics,
    entity::{Companies, Customers, Orders, Posts, Products, products},
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn metrics(state: &AppState) -> AppResult<ApiResponse<DashboardMetrics>> {
    let (total_revenue,): (f64,) =
        sqlx::query_as("SELECT COALESCE(SUM(total_price), 0)::float8 FROM orders")
            .fetch_one(&state.pool)
            .await?;

    let metrics = DashboardMetrics {
        customers_count: Customers::find().count(&state.orm).await?,
        products_count: Products::find()
            .filter(products::Column::DeletedAt.is_null())
            .count(&state.orm)
            .await?,
        orders_count: Orders::find().count(&state.orm).await?,
        total_revenue,
        blogs_count: Posts::find().count(&state.orm).await?,
        companies_count: Companies::find().count(&state.orm).await?,
    };

    tracing::debug!(orders = metrics.orders_count, revenue = metrics.total_revenue, "dashboard metrics");
    Ok(ApiResponse::success(
        "Dashboard metrics",
        metrics,
        Some(Meta::empty()),
    ))
}
