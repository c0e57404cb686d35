use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod auth;
pub mod categories;
pub mod companies;
pub mod customers;
pub mod dashboard;
pub mod doc;
pub mod health;
pub mod order_details;
pub mod order_history;
pub mod orders;
pub mod params;
pub mod posts;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/customers", customers::router())
        .nest("/companies", companies::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/order-details", order_details::router())
        .nest("/order-history", order_history::router())
        .nest("/posts", posts::router())
        .nest("/dashboard", dashboard::router())
}

/// Health, the `/api` tree, docs and the JSON 404 fallback, still awaiting state.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
