use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use validator::Validate;

use crate::{
    dto::{MAX_MONEY, fits_money, order_details::OrderDetailRequest},
    entity::{
        customers::Entity as Customers,
        order_details::{
            ActiveModel as OrderDetailActive, Column as OrderDetailCol, Entity as OrderDetails,
            Model as OrderDetailModel,
        },
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, FieldErrors, ensure_no_field_errors},
    models::{CustomerResource, OrderDetailResource, OrderResource},
    response::{ApiResponse, Meta, Page},
    routes::params::{OrderDetailListQuery, parse_with},
    services::{
        order_service::product_map,
        stock::{adjust_order_total, adjust_stock},
    },
    state::AppState,
};

pub const ORDER_DETAIL_RELATIONS: &[&str] = &["order", "order.customer", "product"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderDetailRelations {
    pub order: bool,
    pub order_customer: bool,
    pub product: bool,
}

impl OrderDetailRelations {
    pub fn standard() -> Self {
        Self {
            order: true,
            order_customer: false,
            product: true,
        }
    }

    pub fn resolve(raw: &Option<String>) -> Self {
        match parse_with(raw, ORDER_DETAIL_RELATIONS) {
            Some(names) => Self {
                order: names.contains(&"order") || names.contains(&"order.customer"),
                order_customer: names.contains(&"order.customer"),
                product: names.contains(&"product"),
            },
            None => Self::standard(),
        }
    }
}

async fn load_details<C: ConnectionTrait>(
    conn: &C,
    details: Vec<OrderDetailModel>,
    relations: OrderDetailRelations,
) -> AppResult<Vec<OrderDetailResource>> {
    let orders: Vec<Option<OrderModel>> = if relations.order {
        details.load_one(Orders, conn).await?
    } else {
        vec![None; details.len()]
    };

    let customers: HashMap<i64, CustomerResource> = if relations.order_customer {
        let owned: Vec<OrderModel> = orders.iter().flatten().cloned().collect();
        let loaded = owned.load_one(Customers, conn).await?;
        owned
            .iter()
            .zip(loaded)
            .filter_map(|(order, customer)| customer.map(|c| (order.id, c.into())))
            .collect()
    } else {
        HashMap::new()
    };

    let products = if relations.product {
        let ids: HashSet<i64> = details.iter().map(|d| d.product_id).collect();
        product_map(conn, ids).await?
    } else {
        HashMap::new()
    };

    Ok(details
        .into_iter()
        .zip(orders)
        .map(|(detail, order)| {
            let product = products.get(&detail.product_id).cloned();
            let mut resource = OrderDetailResource::from(detail);
            resource.order = order.map(|order| {
                let mut order = OrderResource::from(order);
                order.customer = customers.get(&order.id).cloned().map(Box::new);
                Box::new(order)
            });
            resource.product = product.map(Into::into);
            resource
        })
        .collect())
}

async fn find_detail_resource<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    relations: OrderDetailRelations,
) -> AppResult<OrderDetailResource> {
    let detail = OrderDetails::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    load_details(conn, vec![detail], relations)
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

pub async fn list_order_details(
    state: &AppState,
    query: OrderDetailListQuery,
) -> AppResult<ApiResponse<Vec<OrderDetailResource>>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(order_id) = query.order_id {
        condition = condition.add(OrderDetailCol::OrderId.eq(order_id));
    }
    if let Some(product_id) = query.product_id {
        condition = condition.add(OrderDetailCol::ProductId.eq(product_id));
    }

    let finder = OrderDetails::find()
        .filter(condition)
        .order_by_desc(OrderDetailCol::CreatedAt)
        .order_by_desc(OrderDetailCol::Id);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder
        .limit(per_page)
        .offset(offset)
        .all(&state.orm)
        .await?;

    let items = load_details(&state.orm, rows, OrderDetailRelations::resolve(&query.with)).await?;
    let meta = Meta::new(page, per_page, total, items.len() as u64);
    Ok(Page { items, meta }.into_response("Order details"))
}

pub async fn get_order_detail(
    state: &AppState,
    id: i64,
    with: &Option<String>,
) -> AppResult<ApiResponse<OrderDetailResource>> {
    let detail = find_detail_resource(&state.orm, id, OrderDetailRelations::resolve(with)).await?;
    Ok(ApiResponse::success("Order detail", detail, Some(Meta::empty())))
}

/// Checks the referenced rows and that the order total stays within column range.
/// `replacing` is the stored detail on update; its subtotal leaves its order first.
async fn validate_refs<C: ConnectionTrait>(
    conn: &C,
    payload: &OrderDetailRequest,
    replacing: Option<&OrderDetailModel>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    let order = Orders::find_by_id(payload.order_id).one(conn).await?;
    if order.is_none() {
        errors.insert(
            "order_id".into(),
            vec!["The selected order id is invalid.".into()],
        );
    }
    let product_exists = Products::find()
        .filter(ProdCol::Id.eq(payload.product_id))
        .filter(ProdCol::DeletedAt.is_null())
        .count(conn)
        .await?
        > 0;
    if !product_exists {
        errors.insert(
            "product_id".into(),
            vec!["The selected product id is invalid.".into()],
        );
    }

    match payload.subtotal() {
        None => {
            errors.insert(
                "unit_price".into(),
                vec![format!("The line total may not be greater than {MAX_MONEY}.")],
            );
        }
        Some(subtotal) => {
            if let Some(order) = &order {
                let released = replacing
                    .filter(|old| old.order_id == order.id)
                    .map_or(Decimal::ZERO, OrderDetailModel::subtotal);
                let next_total = order
                    .total_price
                    .checked_sub(released)
                    .and_then(|t| t.checked_add(subtotal))
                    .and_then(fits_money);
                if next_total.is_none() {
                    errors.insert(
                        "unit_price".into(),
                        vec![format!(
                            "The order total may not be greater than {MAX_MONEY}."
                        )],
                    );
                }
            }
        }
    }

    ensure_no_field_errors(errors)
}

pub async fn create_order_detail(
    state: &AppState,
    payload: OrderDetailRequest,
) -> AppResult<ApiResponse<OrderDetailResource>> {
    payload.validate()?;
    validate_refs(&state.orm, &payload, None).await?;

    let txn = state.orm.begin().await?;

    let detail = OrderDetailActive {
        order_id: Set(payload.order_id),
        product_id: Set(payload.product_id),
        quantity: Set(payload.quantity),
        unit_price: Set(payload.unit_price),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    adjust_stock(&txn, detail.product_id, -detail.quantity).await?;
    adjust_order_total(&txn, detail.order_id, detail.subtotal()).await?;

    txn.commit().await?;

    tracing::info!(
        detail_id = detail.id,
        order_id = detail.order_id,
        product_id = detail.product_id,
        quantity = detail.quantity,
        "order detail created"
    );

    let resource =
        find_detail_resource(&state.orm, detail.id, OrderDetailRelations::standard()).await?;
    Ok(ApiResponse::success(
        "Order detail created",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn update_order_detail(
    state: &AppState,
    id: i64,
    payload: OrderDetailRequest,
) -> AppResult<ApiResponse<OrderDetailResource>> {
    let existing = OrderDetails::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    payload.validate()?;
    validate_refs(&state.orm, &payload, Some(&existing)).await?;

    let txn = state.orm.begin().await?;

    let old_subtotal = existing.subtotal();
    let old_order_id = existing.order_id;
    adjust_stock(&txn, existing.product_id, existing.quantity).await?;

    let mut active: OrderDetailActive = existing.into();
    active.order_id = Set(payload.order_id);
    active.product_id = Set(payload.product_id);
    active.quantity = Set(payload.quantity);
    active.unit_price = Set(payload.unit_price);
    active.updated_at = Set(Utc::now().into());
    let detail = active.update(&txn).await?;

    adjust_stock(&txn, detail.product_id, -detail.quantity).await?;

    let new_subtotal = detail.subtotal();
    if detail.order_id == old_order_id {
        adjust_order_total(&txn, detail.order_id, new_subtotal - old_subtotal).await?;
    } else {
        adjust_order_total(&txn, old_order_id, -old_subtotal).await?;
        adjust_order_total(&txn, detail.order_id, new_subtotal).await?;
    }

    txn.commit().await?;

    tracing::info!(
        detail_id = detail.id,
        order_id = detail.order_id,
        delta = %(new_subtotal - old_subtotal),
        "order detail updated"
    );

    let resource =
        find_detail_resource(&state.orm, detail.id, OrderDetailRelations::standard()).await?;
    Ok(ApiResponse::success(
        "Order detail updated",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn delete_order_detail(state: &AppState, id: i64) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let detail = OrderDetails::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    adjust_stock(&txn, detail.product_id, detail.quantity).await?;
    adjust_order_total(&txn, detail.order_id, -detail.subtotal()).await?;
    OrderDetails::delete_by_id(detail.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(detail_id = id, order_id = detail.order_id, "order detail deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_loads_order_and_product() {
        assert_eq!(
            OrderDetailRelations::resolve(&None),
            OrderDetailRelations::standard()
        );
        let nested = OrderDetailRelations::resolve(&Some("order.customer".into()));
        assert!(nested.order && nested.order_customer && !nested.product);
    }
}
