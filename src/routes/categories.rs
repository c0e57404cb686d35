use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::categories::CategoryRequest,
    error::AppResult,
    middleware::extract::{JsonBody, QueryParams},
    models::CategoryResource,
    response::ApiResponse,
    routes::params::{CategoryListQuery, WithQuery},
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/roots", get(root_categories))
        .route(
            "/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

#[utoipa::path(
    get,
    path = "/api/categories",
    params(CategoryListQuery),
    responses(
        (status = 200, description = "List categories", body = ApiResponse<Vec<CategoryResource>>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CategoryListQuery>,
) -> AppResult<Json<ApiResponse<Vec<CategoryResource>>>> {
    let resp = category_service::list_categories(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/roots",
    responses(
        (status = 200, description = "Root categories by name", body = ApiResponse<Vec<CategoryResource>>)
    ),
    tag = "Categories"
)]
pub async fn root_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<CategoryResource>>>> {
    let resp = category_service::list_root_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResource>),
        (status = 422, description = "Validation failed")
    ),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CategoryResource>>)> {
    let resp = category_service::create_category(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID"), WithQuery),
    responses(
        (status = 200, description = "Get category", body = ApiResponse<CategoryResource>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    QueryParams(query): QueryParams<WithQuery>,
) -> AppResult<Json<ApiResponse<CategoryResource>>> {
    let resp = category_service::get_category(&state, id, &query.with).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResource>),
        (status = 404, description = "Category not found"),
        (status = 422, description = "Validation failed or parent would form a cycle")
    ),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CategoryRequest>,
) -> AppResult<Json<ApiResponse<CategoryResource>>> {
    let resp = category_service::update_category(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted; children become roots"),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    category_service::delete_category(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
