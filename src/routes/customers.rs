use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::customers::{CreateCustomerRequest, UpdateCustomerRequest},
    error::AppResult,
    export::FileDownload,
    middleware::extract::{JsonBody, QueryParams},
    models::CustomerResource,
    response::ApiResponse,
    routes::params::{ListQuery, SearchQuery, WithQuery},
    services::customer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/export/csv", get(export_csv))
        .route("/export/pdf", get(export_pdf))
        .route(
            "/{id}",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
}

#[utoipa::path(
    get,
    path = "/api/customers",
    params(ListQuery),
    responses(
        (status = 200, description = "List customers", body = ApiResponse<Vec<CustomerResource>>)
    ),
    tag = "Customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<CustomerResource>>>> {
    let resp = customer_service::list_customers(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<CustomerResource>),
        (status = 422, description = "Validation failed")
    ),
    tag = "Customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCustomerRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CustomerResource>>)> {
    let resp = customer_service::create_customer(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = i64, Path, description = "Customer ID"), WithQuery),
    responses(
        (status = 200, description = "Get customer", body = ApiResponse<CustomerResource>),
        (status = 404, description = "Customer not found")
    ),
    tag = "Customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    QueryParams(query): QueryParams<WithQuery>,
) -> AppResult<Json<ApiResponse<CustomerResource>>> {
    let resp = customer_service::get_customer(&state, id, &query.with).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(("id" = i64, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<CustomerResource>),
        (status = 404, description = "Customer not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<UpdateCustomerRequest>,
) -> AppResult<Json<ApiResponse<CustomerResource>>> {
    let resp = customer_service::update_customer(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = i64, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted, stock restored"),
        (status = 404, description = "Customer not found")
    ),
    tag = "Customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    customer_service::delete_customer(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/customers/export/csv",
    params(SearchQuery),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv")
    ),
    tag = "Customers"
)]
pub async fn export_csv(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> AppResult<FileDownload> {
    customer_service::export_customers_csv(&state, query).await
}

#[utoipa::path(
    get,
    path = "/api/customers/export/pdf",
    params(SearchQuery),
    responses(
        (status = 200, description = "PDF download", content_type = "application/pdf")
    ),
    tag = "Customers"
)]
pub async fn export_pdf(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> AppResult<FileDownload> {
    customer_service::export_customers_pdf(&state, query).await
}
