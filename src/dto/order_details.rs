use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::fits_money;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct OrderDetailRequest {
    pub order_id: i64,
    pub product_id: i64,
    #[validate(range(min = 1, message = "The quantity must be at least 1."))]
    pub quantity: i32,
    #[validate(custom(function = "crate::dto::money"))]
    pub unit_price: Decimal,
}

impl OrderDetailRequest {
    pub fn subtotal(&self) -> Option<Decimal> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .and_then(fits_money)
    }
}
