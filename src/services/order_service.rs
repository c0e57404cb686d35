use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use validator::Validate;

use crate::{
    dto::{
        MAX_MONEY,
        dashboard::RevenuePoint,
        orders::{LineItemRequest, OrderRequest},
    },
    entity::{
        customers::{Column as CustCol, Entity as Customers},
        order_details::{ActiveModel as OrderDetailActive, Column as OrderDetailCol, Entity as OrderDetails},
        order_history::{ActiveModel as OrderHistoryActive, Entity as OrderHistory},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, FieldErrors, ensure_no_field_errors},
    export::{FileDownload, PDF_CONTENT_TYPE, PdfDocument, cell, timestamped_filename},
    models::{CustomerResource, OrderDetailResource, OrderHistoryResource, OrderResource},
    response::{ApiResponse, Meta, Page},
    routes::params::{OrderListQuery, RevenueFilter, parse_with, search_term},
    services::stock::{adjust_stock, restore_stock_for},
    state::AppState,
};

pub const ORDER_RELATIONS: &[&str] = &[
    "customer",
    "orderDetails",
    "orderDetails.product",
    "orderHistory",
];

/// Which relations to eager-load alongside orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderRelations {
    pub customer: bool,
    pub details: bool,
    pub products: bool,
    pub history: bool,
}

impl OrderRelations {
    /// Loaded when showing an order without an explicit `with`.
    pub fn show_default() -> Self {
        Self {
            customer: true,
            details: true,
            products: true,
            history: false,
        }
    }

    /// Returned by the create and update workflows.
    pub fn workflow() -> Self {
        Self {
            history: true,
            ..Self::show_default()
        }
    }

    pub fn from_names(names: &[&str]) -> Self {
        let has = |name: &str| names.contains(&name);
        Self {
            customer: has("customer"),
            details: has("orderDetails") || has("orderDetails.product"),
            products: has("orderDetails.product"),
            history: has("orderHistory"),
        }
    }

    pub fn resolve(raw: &Option<String>, default: Self) -> Self {
        match parse_with(raw, ORDER_RELATIONS) {
            Some(names) => Self::from_names(&names),
            None => default,
        }
    }
}

/// Batch-loads the requested relations for `orders`, preserving their order.
pub async fn load_orders<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
    relations: OrderRelations,
) -> AppResult<Vec<OrderResource>> {
    let mut customers = if relations.customer {
        orders.load_one(Customers, conn).await?
    } else {
        Vec::new()
    };
    let mut details = if relations.details {
        orders.load_many(OrderDetails, conn).await?
    } else {
        Vec::new()
    };
    let mut history = if relations.history {
        orders.load_many(OrderHistory, conn).await?
    } else {
        Vec::new()
    };

    let products: HashMap<i64, ProductModel> = if relations.products {
        let ids: HashSet<i64> = details.iter().flatten().map(|d| d.product_id).collect();
        product_map(conn, ids).await?
    } else {
        HashMap::new()
    };

    let mut resources = Vec::with_capacity(orders.len());
    // Drain from the back so each relation vector lines up with its order.
    for order in orders.into_iter().rev() {
        let mut resource = OrderResource::from(order);
        if relations.customer {
            resource.customer = customers
                .pop()
                .flatten()
                .map(|c| Box::new(CustomerResource::from(c)));
        }
        if relations.details {
            let rows = details.pop().unwrap_or_default();
            resource.order_details = Some(
                rows.into_iter()
                    .map(|row| {
                        let product = products.get(&row.product_id).cloned();
                        let mut detail = OrderDetailResource::from(row);
                        if relations.products {
                            detail.product = product.map(Into::into);
                        }
                        detail
                    })
                    .collect(),
            );
        }
        if relations.history {
            let rows = history.pop().unwrap_or_default();
            resource.order_history =
                Some(rows.into_iter().map(OrderHistoryResource::from).collect());
        }
        resources.push(resource);
    }
    resources.reverse();
    Ok(resources)
}

pub(crate) async fn product_map<C: ConnectionTrait>(
    conn: &C,
    ids: HashSet<i64>,
) -> AppResult<HashMap<i64, ProductModel>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    // Soft-deleted products stay resolvable for historical details.
    let rows = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

pub(crate) async fn find_order_resource<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    relations: OrderRelations,
) -> AppResult<OrderResource> {
    let order = Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    load_orders(conn, vec![order], relations)
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<Vec<OrderResource>>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(customer_id) = query.customer_id {
        condition = condition.add(OrderCol::CustomerId.eq(customer_id));
    }

    if let Some(search) = search_term(&query.search) {
        let matching_customers = Query::select()
            .column(CustCol::Id)
            .from(Customers)
            .cond_where(
                Condition::any()
                    .add(CustCol::Username.contains(&search))
                    .add(CustCol::Email.contains(&search)),
            )
            .to_owned();
        condition = condition.add(OrderCol::CustomerId.in_subquery(matching_customers));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::OrderDate)
        .order_by_desc(OrderCol::Id);

    let total = finder.clone().count(&state.orm).await?;

    let rows = finder
        .limit(per_page)
        .offset(offset)
        .all(&state.orm)
        .await?;

    let relations = OrderRelations::resolve(&query.with, OrderRelations::default());
    let items = load_orders(&state.orm, rows, relations).await?;
    let meta = Meta::new(page, per_page, total, items.len() as u64);
    Ok(Page { items, meta }.into_response("Orders"))
}

pub async fn get_order(
    state: &AppState,
    id: i64,
    with: &Option<String>,
) -> AppResult<ApiResponse<OrderResource>> {
    let relations = OrderRelations::resolve(with, OrderRelations::show_default());
    let order = find_order_resource(&state.orm, id, relations).await?;
    Ok(ApiResponse::success("Order", order, Some(Meta::empty())))
}

/// Reference checks that must pass before the workflow opens a transaction.
async fn validate_order_request<C: ConnectionTrait>(
    conn: &C,
    payload: &OrderRequest,
) -> AppResult<Decimal> {
    let mut errors = FieldErrors::new();

    if Customers::find_by_id(payload.customer_id)
        .one(conn)
        .await?
        .is_none()
    {
        errors.insert(
            "customer_id".into(),
            vec!["The selected customer id is invalid.".into()],
        );
    }

    let ids: HashSet<i64> = payload.order_details.iter().map(|d| d.product_id).collect();
    let available: HashSet<i64> = Products::find()
        .select_only()
        .column(ProdCol::Id)
        .filter(ProdCol::Id.is_in(ids))
        .filter(ProdCol::DeletedAt.is_null())
        .into_tuple::<i64>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    for (index, item) in payload.order_details.iter().enumerate() {
        if !available.contains(&item.product_id) {
            errors.insert(
                format!("order_details.{index}.product_id"),
                vec!["The selected product id is invalid.".into()],
            );
        }
    }

    for (index, item) in payload.order_details.iter().enumerate() {
        if item.subtotal().is_none() {
            errors.insert(
                format!("order_details.{index}.unit_price"),
                vec![format!("The line total may not be greater than {MAX_MONEY}.")],
            );
        }
    }

    let total = payload.computed_total();
    match (total, payload.total_price) {
        (None, _) => {
            errors
                .entry("total_price".into())
                .or_default()
                .push(format!("The total price may not be greater than {MAX_MONEY}."));
        }
        (Some(total), Some(claimed)) if claimed != total => {
            errors.insert(
                "total_price".into(),
                vec![format!(
                    "The total price must equal the sum of the order details ({total})."
                )],
            );
        }
        _ => {}
    }

    ensure_no_field_errors(errors)?;
    total.ok_or_else(|| AppError::invalid("total_price", "The total price is out of range."))
}

async fn insert_line_items<C: ConnectionTrait>(
    conn: &C,
    order_id: i64,
    items: &[LineItemRequest],
) -> AppResult<()> {
    for item in items {
        OrderDetailActive {
            order_id: Set(order_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        adjust_stock(conn, item.product_id, -item.quantity).await?;
    }
    Ok(())
}

pub async fn create_order(
    state: &AppState,
    payload: OrderRequest,
) -> AppResult<ApiResponse<OrderResource>> {
    payload.validate()?;
    let total_price = validate_order_request(&state.orm, &payload).await?;
    let order_date = payload.order_date.unwrap_or_else(Utc::now);

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: NotSet,
        customer_id: Set(payload.customer_id),
        order_date: Set(order_date.into()),
        total_price: Set(total_price),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    insert_line_items(&txn, order.id, &payload.order_details).await?;

    OrderHistoryActive {
        customer_id: Set(payload.customer_id),
        order_id: Set(order.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = order.id,
        customer_id = order.customer_id,
        items = payload.order_details.len(),
        total_price = %total_price,
        "order placed"
    );

    let resource = find_order_resource(&state.orm, order.id, OrderRelations::workflow()).await?;

    if let Err(err) = state.notifier.order_placed(&resource).await {
        tracing::warn!(error = %err, order_id = resource.id, "order notification failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn update_order(
    state: &AppState,
    id: i64,
    payload: OrderRequest,
) -> AppResult<ApiResponse<OrderResource>> {
    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    payload.validate()?;
    let total_price = validate_order_request(&state.orm, &payload).await?;

    let txn = state.orm.begin().await?;

    let old_details = OrderDetails::find()
        .filter(OrderDetailCol::OrderId.eq(id))
        .all(&txn)
        .await?;
    restore_stock_for(&txn, &old_details).await?;

    OrderDetails::delete_many()
        .filter(OrderDetailCol::OrderId.eq(id))
        .exec(&txn)
        .await?;

    let mut active: OrderActive = existing.into();
    active.customer_id = Set(payload.customer_id);
    if let Some(order_date) = payload.order_date {
        active.order_date = Set(order_date.into());
    }
    active.total_price = Set(total_price);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    insert_line_items(&txn, order.id, &payload.order_details).await?;

    txn.commit().await?;

    tracing::info!(order_id = order.id, total_price = %total_price, "order updated");

    let resource = find_order_resource(&state.orm, order.id, OrderRelations::workflow()).await?;
    Ok(ApiResponse::success(
        "Order updated",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(state: &AppState, id: i64) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let details = OrderDetails::find()
        .filter(OrderDetailCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    restore_stock_for(&txn, &details).await?;

    // order_details and order_history rows go with the order via ON DELETE CASCADE.
    Orders::delete_by_id(order.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = id, restored_lines = details.len(), "order deleted");
    Ok(())
}

fn revenue_sql(filter: RevenueFilter) -> &'static str {
    match filter {
        RevenueFilter::Day => {
            r#"
            SELECT to_char(date_trunc('hour', order_date), 'HH24:00') AS label,
                   COALESCE(SUM(total_price), 0)::float8 AS revenue,
                   COUNT(*) AS orders
            FROM orders
            WHERE order_date >= date_trunc('day', NOW())
            GROUP BY 1
            ORDER BY 1
            "#
        }
        RevenueFilter::Week => {
            r#"
            SELECT to_char(date_trunc('day', order_date), 'YYYY-MM-DD') AS label,
                   COALESCE(SUM(total_price), 0)::float8 AS revenue,
                   COUNT(*) AS orders
            FROM orders
            WHERE order_date >= date_trunc('day', NOW()) - INTERVAL '6 days'
            GROUP BY 1
            ORDER BY 1
            "#
        }
        RevenueFilter::Month => {
            r#"
            SELECT to_char(date_trunc('day', order_date), 'YYYY-MM-DD') AS label,
                   COALESCE(SUM(total_price), 0)::float8 AS revenue,
                   COUNT(*) AS orders
            FROM orders
            WHERE order_date >= date_trunc('day', NOW()) - INTERVAL '29 days'
            GROUP BY 1
            ORDER BY 1
            "#
        }
    }
}

pub async fn revenue_analytics(
    state: &AppState,
    filter: RevenueFilter,
) -> AppResult<ApiResponse<Vec<RevenuePoint>>> {
    let rows: Vec<(String, f64, i64)> = sqlx::query_as(revenue_sql(filter))
        .fetch_all(&state.pool)
        .await?;

    let points = rows
        .into_iter()
        .map(|(label, revenue, orders)| RevenuePoint {
            label,
            revenue,
            orders,
        })
        .collect();

    Ok(ApiResponse::success(
        "Revenue analytics",
        points,
        Some(Meta::empty()),
    ))
}

pub async fn export_order_pdf(state: &AppState, id: i64) -> AppResult<FileDownload> {
    let order = find_order_resource(&state.orm, id, OrderRelations::show_default()).await?;
    let now = Utc::now();
    Ok(FileDownload {
        filename: timestamped_filename(&format!("order_{}", order.id), "pdf", now),
        content_type: PDF_CONTENT_TYPE,
        bytes: order_document(&order, now).render(),
    })
}

fn order_document(order: &OrderResource, generated_at: chrono::DateTime<Utc>) -> PdfDocument {
    let mut doc = PdfDocument::new("Order Details");
    doc.line(format!("Order #{}", order.id))
        .line(format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S")))
        .blank()
        .line("Customer Information");

    match order.customer.as_deref() {
        Some(customer) => {
            doc.line(format!("  Customer ID: #{}", customer.id))
                .line(format!("  Username: {}", customer.username))
                .line(format!("  Email: {}", customer.email));
            if let Some(phone) = customer.phone_number.as_deref() {
                doc.line(format!("  Phone: {phone}"));
            }
            if let Some(address) = customer.address.as_deref() {
                doc.line(format!("  Address: {address}"));
            }
        }
        None => {
            doc.line("  Customer information not available");
        }
    }

    let details = order.order_details.as_deref().unwrap_or_default();
    let quantity: i64 = details.iter().map(|d| i64::from(d.quantity)).sum();
    doc.blank()
        .line("Order Information")
        .line(format!("  Order Date: {}", order.order_date.format("%Y-%m-%d %H:%M:%S")))
        .line(format!("  Total Items: {} item(s)", details.len()))
        .line(format!("  Total Quantity: {quantity} unit(s)"))
        .line(format!("  Created At: {}", order.created_at.format("%Y-%m-%d %H:%M:%S")))
        .blank()
        .line("Products in Order");

    if details.is_empty() {
        doc.line("  No products in this order");
    } else {
        doc.line(format!(
            "{} {} {} {} {}",
            cell("#", 4),
            cell("Product", 36),
            cell("Qty", 6),
            cell("Unit Price", 12),
            "Subtotal"
        ));
        for (index, detail) in details.iter().enumerate() {
            let title = detail
                .product
                .as_ref()
                .map(|p| p.title.as_str())
                .unwrap_or("Product N/A");
            doc.line(format!(
                "{} {} {} {} {}",
                cell(&(index + 1).to_string(), 4),
                cell(title, 36),
                cell(&detail.quantity.to_string(), 6),
                cell(&format!("${:.2}", detail.unit_price), 12),
                format!("${:.2}", detail.subtotal)
            ));
        }
    }

    doc.blank()
        .line(format!("Total Amount: ${:.2}", order.total_price));
    doc
}
