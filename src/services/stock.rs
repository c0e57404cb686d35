//! Relative counter updates shared by the order workflows.
//!
//! Both helpers issue a single `UPDATE ... SET col = col + ?`, so concurrent
//! workflows never overwrite each other's adjustment.

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

use crate::entity::{
    order_details::Model as OrderDetailModel,
    orders::{Column as OrderCol, Entity as Orders},
    products::{Column as ProdCol, Entity as Products},
};

/// Positive `delta` restores stock, negative consumes it. A missing product is skipped.
pub async fn adjust_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    delta: i32,
) -> Result<(), DbErr> {
    if delta == 0 {
        return Ok(());
    }
    let result = Products::update_many()
        .col_expr(
            ProdCol::StockQuantity,
            Expr::col(ProdCol::StockQuantity).add(delta),
        )
        .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(ProdCol::Id.eq(product_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        tracing::debug!(product_id, delta, "product missing, stock adjustment skipped");
    }
    Ok(())
}

pub async fn adjust_order_total<C: ConnectionTrait>(
    conn: &C,
    order_id: i64,
    delta: Decimal,
) -> Result<(), DbErr> {
    if delta.is_zero() {
        return Ok(());
    }
    Orders::update_many()
        .col_expr(OrderCol::TotalPrice, Expr::col(OrderCol::TotalPrice).add(delta))
        .col_expr(OrderCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(OrderCol::Id.eq(order_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Gives back the stock held by each detail.
pub async fn restore_stock_for<C: ConnectionTrait>(
    conn: &C,
    details: &[OrderDetailModel],
) -> Result<(), DbErr> {
    for detail in details {
        adjust_stock(conn, detail.product_id, detail.quantity).await?;
    }
    Ok(())
}
