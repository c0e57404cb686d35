use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::companies::CompanyRequest,
    error::AppResult,
    middleware::extract::{JsonBody, QueryParams},
    models::CompanyResource,
    response::ApiResponse,
    routes::params::ListQuery,
    services::company_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/{id}",
            get(get_company).put(update_company).delete(delete_company),
        )
}

#[utoipa::path(
    get,
    path = "/api/companies",
    params(ListQuery),
    responses(
        (status = 200, description = "List companies", body = ApiResponse<Vec<CompanyResource>>)
    ),
    tag = "Companies"
)]
pub async fn list_companies(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<CompanyResource>>>> {
    let resp = company_service::list_companies(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = CompanyRequest,
    responses(
        (status = 201, description = "Company created", body = ApiResponse<CompanyResource>),
        (status = 422, description = "Validation failed")
    ),
    tag = "Companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CompanyRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CompanyResource>>)> {
    let resp = company_service::create_company(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    params(("id" = i64, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Get company", body = ApiResponse<CompanyResource>),
        (status = 404, description = "Company not found")
    ),
    tag = "Companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<CompanyResource>>> {
    let resp = company_service::get_company(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    params(("id" = i64, Path, description = "Company ID")),
    request_body = CompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = ApiResponse<CompanyResource>),
        (status = 404, description = "Company not found")
    ),
    tag = "Companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CompanyRequest>,
) -> AppResult<Json<ApiResponse<CompanyResource>>> {
    let resp = company_service::update_company(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    params(("id" = i64, Path, description = "Company ID")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 404, description = "Company not found")
    ),
    tag = "Companies"
)]
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    company_service::delete_company(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
