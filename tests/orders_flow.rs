mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_admin_api::{
    dto::{
        order_details::OrderDetailRequest,
        orders::{LineItemRequest, OrderRequest},
    },
    entity::{OrderDetails, OrderHistory, Orders, order_details, order_history, orders},
    error::AppError,
    models::OrderResource,
    notify::OrderNotifier,
    routes::params::{OrderListQuery, RevenueFilter},
    services::{customer_service, dashboard_service, order_detail_service, order_service},
};

use common::{create_customer, create_product, money, product, test_state};

#[derive(Default)]
struct RecordingNotifier {
    orders: Mutex<Vec<i64>>,
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn order_placed(&self, order: &OrderResource) -> anyhow::Result<()> {
        self.orders.lock().unwrap().push(order.id);
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl OrderNotifier for FailingNotifier {
    async fn order_placed(&self, _order: &OrderResource) -> anyhow::Result<()> {
        anyhow::bail!("smtp unavailable")
    }
}

fn line(product_id: i64, quantity: i32, cents: i64) -> LineItemRequest {
    LineItemRequest {
        product_id,
        quantity,
        unit_price: money(cents),
    }
}

// Placement -> line edits -> replacement -> deletion, checking stock and totals at each step.
#[tokio::test]
async fn order_lifecycle_keeps_stock_and_totals_consistent() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let notifier = Arc::new(RecordingNotifier::default());
    let state = state.with_notifier(notifier.clone());

    let customer_id = create_customer(&state, "alice").await?;
    let widget = create_product(&state, "Widget", money(999), 10).await?;
    let gadget = create_product(&state, "Gadget", money(500), 20).await?;

    // A client total that disagrees with the lines is rejected before anything is written.
    let mismatch = order_service::create_order(
        &state,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: Some(money(1000)),
            order_details: vec![line(widget, 3, 999)],
        },
    )
    .await;
    assert!(matches!(mismatch, Err(AppError::Validation(ref f)) if f.contains_key("total_price")));
    assert_eq!(product(&state, widget).await?.stock_quantity, 10);

    let created = order_service::create_order(
        &state,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![line(widget, 3, 999)],
        },
    )
    .await?;
    let order = created.data.expect("order");
    assert_eq!(order.total_price, money(2997));
    assert_eq!(order.order_details.as_ref().map(Vec::len), Some(1));
    assert_eq!(order.order_history.as_ref().map(Vec::len), Some(1));
    assert_eq!(
        order.order_details.as_ref().unwrap()[0]
            .product
            .as_ref()
            .map(|p| p.id),
        Some(widget)
    );
    assert_eq!(product(&state, widget).await?.stock_quantity, 7);
    assert_eq!(notifier.orders.lock().unwrap().as_slice(), &[order.id]);

    // Listing by customer, with per_page clamped.
    let listed = order_service::list_orders(
        &state,
        OrderListQuery {
            customer_id: Some(customer_id),
            per_page: Some(500),
            with: Some("customer,bogus".into()),
            ..Default::default()
        },
    )
    .await?;
    let meta = listed.meta.expect("meta");
    assert_eq!(meta.total, Some(1));
    assert_eq!(meta.per_page, Some(100));
    let listed = listed.data.expect("orders");
    assert!(listed[0].customer.is_some());
    assert!(listed[0].order_details.is_none());

    // Standalone line edits move the order total by exactly the subtotal delta.
    let detail = order_detail_service::create_order_detail(
        &state,
        OrderDetailRequest {
            order_id: order.id,
            product_id: gadget,
            quantity: 2,
            unit_price: money(500),
        },
    )
    .await?
    .data
    .expect("detail");
    assert_eq!(detail.subtotal, money(1000));
    assert_eq!(product(&state, gadget).await?.stock_quantity, 18);
    assert_eq!(order_total(&state, order.id).await?, money(3997));

    order_detail_service::update_order_detail(
        &state,
        detail.id,
        OrderDetailRequest {
            order_id: order.id,
            product_id: gadget,
            quantity: 1,
            unit_price: money(500),
        },
    )
    .await?;
    assert_eq!(product(&state, gadget).await?.stock_quantity, 19);
    assert_eq!(order_total(&state, order.id).await?, money(3497));

    order_detail_service::delete_order_detail(&state, detail.id).await?;
    assert_eq!(product(&state, gadget).await?.stock_quantity, 20);
    assert_eq!(order_total(&state, order.id).await?, money(2997));

    // Replacing the lines restores the old stock before consuming the new.
    let updated = order_service::update_order(
        &state,
        order.id,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: Some(money(999)),
            order_details: vec![line(widget, 1, 999)],
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(updated.total_price, money(999));
    assert_eq!(updated.order_date, order.order_date);
    assert_eq!(product(&state, widget).await?.stock_quantity, 9);

    let pdf = order_service::export_order_pdf(&state, order.id).await?;
    assert!(pdf.bytes.starts_with(b"%PDF-1.4"));
    assert!(pdf.filename.starts_with(&format!("order_{}_", order.id)));

    order_service::revenue_analytics(&state, RevenueFilter::Month).await?;
    let metrics = dashboard_service::metrics(&state).await?.data.expect("metrics");
    assert!(metrics.orders_count >= 1);
    assert!(metrics.total_revenue >= 9.99);

    order_service::delete_order(&state, order.id).await?;
    assert_eq!(product(&state, widget).await?.stock_quantity, 10);
    assert!(matches!(
        order_service::get_order(&state, order.id, &None).await,
        Err(AppError::NotFound)
    ));

    // Deleting a customer gives back the stock their orders held.
    let failing = state.clone().with_notifier(Arc::new(FailingNotifier));
    let second = order_service::create_order(
        &failing,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![line(widget, 2, 999)],
        },
    )
    .await?
    .data
    .expect("order placed despite notifier failure");
    assert_eq!(product(&state, widget).await?.stock_quantity, 8);

    customer_service::delete_customer(&state, customer_id).await?;
    assert_eq!(product(&state, widget).await?.stock_quantity, 10);
    assert!(Orders::find_by_id(second.id).one(&state.orm).await?.is_none());

    Ok(())
}

// Stock this close to the integer floor cannot absorb another sale, so the
// database rejects the adjustment after earlier statements already ran.
const EXHAUSTED_STOCK: i32 = i32::MIN + 1;

#[tokio::test]
async fn failed_placement_leaves_nothing_behind() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let customer_id = create_customer(&state, "frank").await?;
    let widget = create_product(&state, "Widget", money(999), 10).await?;
    let exhausted = create_product(&state, "Ledger", money(100), EXHAUSTED_STOCK).await?;

    let placed = order_service::create_order(
        &state,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![line(widget, 3, 999), line(exhausted, 2, 100)],
        },
    )
    .await;
    assert!(matches!(placed, Err(AppError::OrmError(_))));

    let orders = Orders::find()
        .filter(orders::Column::CustomerId.eq(customer_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);
    let history = OrderHistory::find()
        .filter(order_history::Column::CustomerId.eq(customer_id))
        .count(&state.orm)
        .await?;
    assert_eq!(history, 0);
    let details = OrderDetails::find()
        .filter(order_details::Column::ProductId.eq(widget))
        .count(&state.orm)
        .await?;
    assert_eq!(details, 0);
    assert_eq!(product(&state, widget).await?.stock_quantity, 10);
    assert_eq!(product(&state, exhausted).await?.stock_quantity, EXHAUSTED_STOCK);

    customer_service::delete_customer(&state, customer_id).await?;
    Ok(())
}

#[tokio::test]
async fn failed_replacement_keeps_the_previous_lines() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let customer_id = create_customer(&state, "grace").await?;
    let widget = create_product(&state, "Widget", money(999), 10).await?;
    let exhausted = create_product(&state, "Ledger", money(100), EXHAUSTED_STOCK).await?;

    let order = order_service::create_order(
        &state,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![line(widget, 2, 999)],
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(product(&state, widget).await?.stock_quantity, 8);

    // The old lines are restored and deleted before the failing line is reached.
    let replaced = order_service::update_order(
        &state,
        order.id,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![line(widget, 5, 999), line(exhausted, 2, 100)],
        },
    )
    .await;
    assert!(matches!(replaced, Err(AppError::OrmError(_))));

    let kept = order_service::get_order(&state, order.id, &Some("orderDetails".into()))
        .await?
        .data
        .expect("order");
    assert_eq!(kept.total_price, money(1998));
    let lines = kept.order_details.expect("details");
    assert_eq!(lines.len(), 1);
    assert_eq!((lines[0].product_id, lines[0].quantity), (widget, 2));
    assert_eq!(product(&state, widget).await?.stock_quantity, 8);
    assert_eq!(product(&state, exhausted).await?.stock_quantity, EXHAUSTED_STOCK);

    order_service::delete_order(&state, order.id).await?;
    assert_eq!(product(&state, widget).await?.stock_quantity, 10);
    customer_service::delete_customer(&state, customer_id).await?;
    Ok(())
}

#[tokio::test]
async fn moving_a_line_between_orders_moves_its_subtotal() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let customer_id = create_customer(&state, "heidi").await?;
    let widget = create_product(&state, "Widget", money(999), 10).await?;
    let gadget = create_product(&state, "Gadget", money(500), 10).await?;

    let place = |product_id, quantity, cents| OrderRequest {
        customer_id,
        order_date: None,
        total_price: None,
        order_details: vec![line(product_id, quantity, cents)],
    };
    let from = order_service::create_order(&state, place(widget, 1, 999))
        .await?
        .data
        .expect("order");
    let to = order_service::create_order(&state, place(widget, 2, 999))
        .await?
        .data
        .expect("order");

    let detail = order_detail_service::create_order_detail(
        &state,
        OrderDetailRequest {
            order_id: from.id,
            product_id: gadget,
            quantity: 2,
            unit_price: money(500),
        },
    )
    .await?
    .data
    .expect("detail");
    assert_eq!(order_total(&state, from.id).await?, money(1999));
    assert_eq!(product(&state, gadget).await?.stock_quantity, 8);

    // Re-homed with a new quantity: the source gives back the old subtotal,
    // the target takes the new one.
    let moved = order_detail_service::update_order_detail(
        &state,
        detail.id,
        OrderDetailRequest {
            order_id: to.id,
            product_id: gadget,
            quantity: 3,
            unit_price: money(500),
        },
    )
    .await?
    .data
    .expect("detail");
    assert_eq!(moved.order_id, to.id);
    assert_eq!(order_total(&state, from.id).await?, money(999));
    assert_eq!(order_total(&state, to.id).await?, money(3498));
    assert_eq!(product(&state, gadget).await?.stock_quantity, 7);

    order_service::delete_order(&state, to.id).await?;
    assert_eq!(product(&state, gadget).await?.stock_quantity, 10);
    order_service::delete_order(&state, from.id).await?;
    assert_eq!(product(&state, widget).await?.stock_quantity, 10);
    customer_service::delete_customer(&state, customer_id).await?;
    Ok(())
}

#[tokio::test]
async fn oversized_totals_are_rejected_before_writing() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let customer_id = create_customer(&state, "ivan").await?;
    let widget = create_product(&state, "Widget", money(999), 10_000).await?;

    let wide = order_service::create_order(
        &state,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![line(widget, 2_000, 999_999_999)],
        },
    )
    .await;
    assert!(matches!(
        wide,
        Err(AppError::Validation(ref f)) if f.contains_key("order_details.0.unit_price")
    ));
    assert_eq!(product(&state, widget).await?.stock_quantity, 10_000);

    customer_service::delete_customer(&state, customer_id).await?;
    Ok(())
}

async fn order_total(
    state: &storefront_admin_api::state::AppState,
    id: i64,
) -> anyhow::Result<rust_decimal::Decimal> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("order {id} missing"))?;
    Ok(order.total_price)
}
