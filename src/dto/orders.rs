use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::fits_money;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct LineItemRequest {
    pub product_id: i64,
    #[validate(range(min = 1, message = "The quantity must be at least 1."))]
    pub quantity: i32,
    #[validate(custom(function = "crate::dto::money"))]
    pub unit_price: Decimal,
}

impl LineItemRequest {
    /// `None` when `quantity × unit_price` does not fit a money column.
    pub fn subtotal(&self) -> Option<Decimal> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .and_then(fits_money)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct OrderRequest {
    pub customer_id: i64,
    /// Defaults to now on create; kept unchanged on update when absent.
    pub order_date: Option<DateTime<Utc>>,
    /// Optional; when given it must equal the sum of the line subtotals.
    #[validate(custom(function = "crate::dto::money"))]
    pub total_price: Option<Decimal>,
    #[validate(
        length(min = 1, message = "The order details field is required."),
        nested
    )]
    pub order_details: Vec<LineItemRequest>,
}

impl OrderRequest {
    /// Sum of the line subtotals; `None` once any amount leaves column range.
    pub fn computed_total(&self) -> Option<Decimal> {
        self.order_details
            .iter()
            .try_fold(Decimal::ZERO, |total, item| {
                total.checked_add(item.subtotal()?).and_then(fits_money)
            })
    }
}
