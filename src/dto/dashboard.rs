use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardMetrics {
    pub customers_count: u64,
    pub products_count: u64,
    pub orders_count: u64,
    pub total_revenue: f64,
    pub blogs_count: u64,
    pub companies_count: u64,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct RevenuePoint {
    /// `HH:00` for the day view, `YYYY-MM-DD` otherwise.
    pub label: String,
    pub revenue: f64,
    pub orders: i64,
}
