use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::dashboard::DashboardMetrics, error::AppResult, response::ApiResponse,
    services::dashboard_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    responses(
        (status = 200, description = "Entity counts and total revenue", body = ApiResponse<DashboardMetrics>)
    ),
    tag = "Dashboard"
)]
pub async fn metrics(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DashboardMetrics>>> {
    let resp = dashboard_service::metrics(&state).await?;
    Ok(Json(resp))
}
