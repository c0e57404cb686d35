use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    dto::order_history::OrderHistoryRequest,
    entity::{
        customers::Entity as Customers,
        order_history::{
            ActiveModel as HistoryActive, Column as HistoryCol, Entity as OrderHistory,
            Model as HistoryModel,
        },
        orders::{Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult, FieldErrors, ensure_no_field_errors, on_unique_violation},
    models::{CustomerResource, OrderHistoryResource},
    response::{ApiResponse, Meta, Page},
    routes::params::{OrderHistoryListQuery, parse_with},
    services::order_service::{OrderRelations, load_orders},
    state::AppState,
};

pub const ORDER_HISTORY_RELATIONS: &[&str] = &[
    "customer",
    "order",
    "order.orderDetails",
    "order.orderDetails.product",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryRelations {
    pub customer: bool,
    pub order: bool,
    pub order_details: bool,
    pub order_products: bool,
}

impl HistoryRelations {
    pub fn standard() -> Self {
        Self {
            customer: true,
            order: true,
            ..Self::default()
        }
    }

    pub fn resolve(raw: &Option<String>) -> Self {
        let Some(names) = parse_with(raw, ORDER_HISTORY_RELATIONS) else {
            return Self::standard();
        };
        let has = |name: &str| names.contains(&name);
        let order_products = has("order.orderDetails.product");
        let order_details = order_products || has("order.orderDetails");
        Self {
            customer: has("customer"),
            order: order_details || has("order"),
            order_details,
            order_products,
        }
    }
}

async fn load_history<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<HistoryModel>,
    relations: HistoryRelations,
) -> AppResult<Vec<OrderHistoryResource>> {
    let customers = if relations.customer {
        rows.load_one(Customers, conn).await?
    } else {
        vec![None; rows.len()]
    };

    let orders = if relations.order {
        let models: Vec<Option<OrderModel>> = rows.load_one(Orders, conn).await?;
        let present: Vec<OrderModel> = models.iter().flatten().cloned().collect();
        let nested = OrderRelations {
            details: relations.order_details,
            products: relations.order_products,
            ..OrderRelations::default()
        };
        let mut loaded = load_orders(conn, present, nested).await?.into_iter();
        models
            .into_iter()
            .map(|m| m.and_then(|_| loaded.next()))
            .collect()
    } else {
        vec![None; rows.len()]
    };

    Ok(rows
        .into_iter()
        .zip(customers)
        .zip(orders)
        .map(|((row, customer), order)| {
            let mut resource = OrderHistoryResource::from(row);
            resource.customer = customer.map(|c| Box::new(CustomerResource::from(c)));
            resource.order = order.map(Box::new);
            resource
        })
        .collect())
}

async fn find_history_resource<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    relations: HistoryRelations,
) -> AppResult<OrderHistoryResource> {
    let row = OrderHistory::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    load_history(conn, vec![row], relations)
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

pub async fn list_order_history(
    state: &AppState,
    query: OrderHistoryListQuery,
) -> AppResult<ApiResponse<Vec<OrderHistoryResource>>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(customer_id) = query.customer_id {
        condition = condition.add(HistoryCol::CustomerId.eq(customer_id));
    }
    if let Some(order_id) = query.order_id {
        condition = condition.add(HistoryCol::OrderId.eq(order_id));
    }

    let finder = OrderHistory::find()
        .filter(condition)
        .order_by_desc(HistoryCol::CreatedAt)
        .order_by_desc(HistoryCol::Id);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder
        .limit(per_page)
        .offset(offset)
        .all(&state.orm)
        .await?;

    let items = load_history(&state.orm, rows, HistoryRelations::resolve(&query.with)).await?;
    let meta = Meta::new(page, per_page, total, items.len() as u64);
    Ok(Page { items, meta }.into_response("Order history"))
}

pub async fn get_order_history(
    state: &AppState,
    id: i64,
    with: &Option<String>,
) -> AppResult<ApiResponse<OrderHistoryResource>> {
    let row = find_history_resource(&state.orm, id, HistoryRelations::resolve(with)).await?;
    Ok(ApiResponse::success("Order history", row, Some(Meta::empty())))
}

/// Rejects missing references, then a pair already held by another row.
async fn check_pair<C: ConnectionTrait>(
    conn: &C,
    payload: &OrderHistoryRequest,
    exclude_id: Option<i64>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if Customers::find_by_id(payload.customer_id).one(conn).await?.is_none() {
        errors.insert(
            "customer_id".into(),
            vec!["The selected customer id is invalid.".into()],
        );
    }
    if Orders::find_by_id(payload.order_id).one(conn).await?.is_none() {
        errors.insert(
            "order_id".into(),
            vec!["The selected order id is invalid.".into()],
        );
    }
    ensure_no_field_errors(errors)?;

    let mut duplicate = OrderHistory::find()
        .filter(HistoryCol::CustomerId.eq(payload.customer_id))
        .filter(HistoryCol::OrderId.eq(payload.order_id));
    if let Some(id) = exclude_id {
        duplicate = duplicate.filter(HistoryCol::Id.ne(id));
    }
    if duplicate.count(conn).await? > 0 {
        return Err(duplicate_pair());
    }
    Ok(())
}

fn duplicate_pair() -> AppError {
    AppError::Conflict("This order history record already exists.".into())
}

pub async fn create_order_history(
    state: &AppState,
    payload: OrderHistoryRequest,
) -> AppResult<ApiResponse<OrderHistoryResource>> {
    check_pair(&state.orm, &payload, None).await?;

    let row = HistoryActive {
        customer_id: Set(payload.customer_id),
        order_id: Set(payload.order_id),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|err| on_unique_violation(err, |_| duplicate_pair()))?;

    tracing::info!(history_id = row.id, order_id = row.order_id, "order history created");

    let resource = find_history_resource(&state.orm, row.id, HistoryRelations::standard()).await?;
    Ok(ApiResponse::success(
        "Order history created",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn update_order_history(
    state: &AppState,
    id: i64,
    payload: OrderHistoryRequest,
) -> AppResult<ApiResponse<OrderHistoryResource>> {
    let existing = OrderHistory::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    check_pair(&state.orm, &payload, Some(id)).await?;

    let mut active: HistoryActive = existing.into();
    active.customer_id = Set(payload.customer_id);
    active.order_id = Set(payload.order_id);
    active.updated_at = Set(Utc::now().into());
    let row = active
        .update(&state.orm)
        .await
        .map_err(|err| on_unique_violation(err, |_| duplicate_pair()))?;

    let resource = find_history_resource(&state.orm, row.id, HistoryRelations::standard()).await?;
    Ok(ApiResponse::success(
        "Order history updated",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn delete_order_history(state: &AppState, id: i64) -> AppResult<()> {
    let result = OrderHistory::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(history_id = id, "order history deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_order_relations_imply_order() {
        let rel = HistoryRelations::resolve(&Some("order.orderDetails.product".into()));
        assert!(rel.order && rel.order_details && rel.order_products);
        assert!(!rel.customer);
        assert_eq!(HistoryRelations::resolve(&None), HistoryRelations::standard());
    }
}
