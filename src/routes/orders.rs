use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::{dashboard::RevenuePoint, orders::OrderRequest},
    error::AppResult,
    export::FileDownload,
    middleware::extract::{JsonBody, QueryParams},
    models::OrderResource,
    response::ApiResponse,
    routes::params::{OrderListQuery, RevenueQuery, WithQuery},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/revenue-analytics", get(revenue_analytics))
        .route(
            "/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/{id}/export/pdf", get(export_order_pdf))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "List orders", body = ApiResponse<Vec<OrderResource>>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OrderListQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderResource>>>> {
    let resp = order_service::list_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderResource>),
        (status = 422, description = "Validation failed")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<OrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderResource>>)> {
    let resp = order_service::create_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order ID"), WithQuery),
    responses(
        (status = 200, description = "Get order", body = ApiResponse<OrderResource>),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    QueryParams(query): QueryParams<WithQuery>,
) -> AppResult<Json<ApiResponse<OrderResource>>> {
    let resp = order_service::get_order(&state, id, &query.with).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order ID")),
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Order replaced", body = ApiResponse<OrderResource>),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<OrderRequest>,
) -> AppResult<Json<ApiResponse<OrderResource>>> {
    let resp = order_service::update_order(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted, stock restored"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    order_service::delete_order(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/export/pdf",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "PDF download", content_type = "application/pdf"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn export_order_pdf(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<FileDownload> {
    order_service::export_order_pdf(&state, id).await
}

#[utoipa::path(
    get,
    path = "/api/orders/revenue-analytics",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Revenue per hour (day) or per date (week, month)", body = ApiResponse<Vec<RevenuePoint>>)
    ),
    tag = "Orders"
)]
pub async fn revenue_analytics(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<RevenueQuery>,
) -> AppResult<Json<ApiResponse<Vec<RevenuePoint>>>> {
    let resp = order_service::revenue_analytics(&state, query.filter.unwrap_or_default()).await?;
    Ok(Json(resp))
}
