use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::{ApiResponse, Meta};

/// Liveness payload naming the running build.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

impl ServiceStatus {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            status: "up",
        }
    }
}

/// Answers without touching the database, so it only reports that the process serves requests.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is accepting requests", body = ApiResponse<ServiceStatus>),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<ServiceStatus>> {
    let status = ServiceStatus::current();
    let message = format!("{} {} is up", status.name, status.version);
    Json(ApiResponse::success(message, status, Some(Meta::empty())))
}
