use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::order_details::OrderDetailRequest,
    error::AppResult,
    middleware::extract::{JsonBody, QueryParams},
    models::OrderDetailResource,
    response::ApiResponse,
    routes::params::{OrderDetailListQuery, WithQuery},
    services::order_detail_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_order_details).post(create_order_detail))
        .route(
            "/{id}",
            get(get_order_detail)
                .put(update_order_detail)
                .delete(delete_order_detail),
        )
}

#[utoipa::path(
    get,
    path = "/api/order-details",
    params(OrderDetailListQuery),
    responses(
        (status = 200, description = "List order details", body = ApiResponse<Vec<OrderDetailResource>>)
    ),
    tag = "Order details"
)]
pub async fn list_order_details(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OrderDetailListQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderDetailResource>>>> {
    let resp = order_detail_service::list_order_details(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order-details",
    request_body = OrderDetailRequest,
    responses(
        (status = 201, description = "Line added; stock and order total adjusted", body = ApiResponse<OrderDetailResource>),
        (status = 422, description = "Validation failed")
    ),
    tag = "Order details"
)]
pub async fn create_order_detail(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<OrderDetailRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderDetailResource>>)> {
    let resp = order_detail_service::create_order_detail(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/order-details/{id}",
    params(("id" = i64, Path, description = "Order detail ID"), WithQuery),
    responses(
        (status = 200, description = "Get order detail", body = ApiResponse<OrderDetailResource>),
        (status = 404, description = "Order detail not found")
    ),
    tag = "Order details"
)]
pub async fn get_order_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    QueryParams(query): QueryParams<WithQuery>,
) -> AppResult<Json<ApiResponse<OrderDetailResource>>> {
    let resp = order_detail_service::get_order_detail(&state, id, &query.with).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/order-details/{id}",
    params(("id" = i64, Path, description = "Order detail ID")),
    request_body = OrderDetailRequest,
    responses(
        (status = 200, description = "Line updated; stock and totals adjusted", body = ApiResponse<OrderDetailResource>),
        (status = 404, description = "Order detail not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Order details"
)]
pub async fn update_order_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<OrderDetailRequest>,
) -> AppResult<Json<ApiResponse<OrderDetailResource>>> {
    let resp = order_detail_service::update_order_detail(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/order-details/{id}",
    params(("id" = i64, Path, description = "Order detail ID")),
    responses(
        (status = 204, description = "Line removed; stock and order total restored"),
        (status = 404, description = "Order detail not found")
    ),
    tag = "Order details"
)]
pub async fn delete_order_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    order_detail_service::delete_order_detail(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
