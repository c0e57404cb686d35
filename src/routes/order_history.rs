use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::order_history::OrderHistoryRequest,
    error::AppResult,
    middleware::extract::{JsonBody, QueryParams},
    models::OrderHistoryResource,
    response::ApiResponse,
    routes::params::{OrderHistoryListQuery, WithQuery},
    services::order_history_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_order_history).post(create_order_history))
        .route(
            "/{id}",
            get(get_order_history)
                .put(update_order_history)
                .delete(delete_order_history),
        )
}

#[utoipa::path(
    get,
    path = "/api/order-history",
    params(OrderHistoryListQuery),
    responses(
        (status = 200, description = "List order history", body = ApiResponse<Vec<OrderHistoryResource>>)
    ),
    tag = "Order history"
)]
pub async fn list_order_history(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OrderHistoryListQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderHistoryResource>>>> {
    let resp = order_history_service::list_order_history(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order-history",
    request_body = OrderHistoryRequest,
    responses(
        (status = 201, description = "History entry created", body = ApiResponse<OrderHistoryResource>),
        (status = 409, description = "Pair already recorded"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Order history"
)]
pub async fn create_order_history(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<OrderHistoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderHistoryResource>>)> {
    let resp = order_history_service::create_order_history(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/order-history/{id}",
    params(("id" = i64, Path, description = "Order history ID"), WithQuery),
    responses(
        (status = 200, description = "Get history entry", body = ApiResponse<OrderHistoryResource>),
        (status = 404, description = "History entry not found")
    ),
    tag = "Order history"
)]
pub async fn get_order_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    QueryParams(query): QueryParams<WithQuery>,
) -> AppResult<Json<ApiResponse<OrderHistoryResource>>> {
    let resp = order_history_service::get_order_history(&state, id, &query.with).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/order-history/{id}",
    params(("id" = i64, Path, description = "Order history ID")),
    request_body = OrderHistoryRequest,
    responses(
        (status = 200, description = "History entry updated", body = ApiResponse<OrderHistoryResource>),
        (status = 404, description = "History entry not found"),
        (status = 409, description = "Pair already recorded on another entry")
    ),
    tag = "Order history"
)]
pub async fn update_order_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<OrderHistoryRequest>,
) -> AppResult<Json<ApiResponse<OrderHistoryResource>>> {
    let resp = order_history_service::update_order_history(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/order-history/{id}",
    params(("id" = i64, Path, description = "Order history ID")),
    responses(
        (status = 204, description = "History entry deleted"),
        (status = 404, description = "History entry not found")
    ),
    tag = "Order history"
)]
pub async fn delete_order_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    order_history_service::delete_order_history(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
