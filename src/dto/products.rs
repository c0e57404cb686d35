use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "The title field is required."))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[validate(custom(function = "crate::dto::money"))]
    pub price: Decimal,
    #[validate(custom(function = "crate::dto::money"))]
    pub sales_off: Option<Decimal>,
    #[validate(custom(function = "crate::dto::money"))]
    pub low_price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub status: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "The title field is required."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[validate(custom(function = "crate::dto::money"))]
    pub price: Option<Decimal>,
    #[validate(custom(function = "crate::dto::money"))]
    pub sales_off: Option<Decimal>,
    #[validate(custom(function = "crate::dto::money"))]
    pub low_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<i64>,
    pub active: Option<bool>,
    pub status: Option<bool>,
}
