use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderHistoryRequest {
    pub customer_id: i64,
    pub order_id: i64,
}
