mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_admin_api::{
    dto::{
        customers::CreateCustomerRequest,
        order_history::OrderHistoryRequest,
        orders::{LineItemRequest, OrderRequest},
    },
    entity::{OrderHistory, order_history},
    error::AppError,
    routes::params::OrderHistoryListQuery,
    services::{customer_service, order_history_service, order_service},
};

use common::{create_customer, create_product, money, test_state, unique};

#[tokio::test]
async fn duplicate_pair_is_a_conflict() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let customer_id = create_customer(&state, "bob").await?;
    let product_id = create_product(&state, "Lamp", money(1500), 5).await?;
    let order = order_service::create_order(
        &state,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![LineItemRequest {
                product_id,
                quantity: 1,
                unit_price: money(1500),
            }],
        },
    )
    .await?
    .data
    .expect("order");

    let pair = || OrderHistoryRequest {
        customer_id,
        order_id: order.id,
    };

    // Placement already recorded the pair.
    assert!(matches!(
        order_history_service::create_order_history(&state, pair()).await,
        Err(AppError::Conflict(_))
    ));

    let existing = order_history_service::list_order_history(
        &state,
        OrderHistoryListQuery {
            order_id: Some(order.id),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("history");
    assert_eq!(existing.len(), 1);
    assert!(existing[0].customer.is_some());
    assert!(existing[0].order.is_some());
    let entry_id = existing[0].id;

    // Re-saving a row with its own pair is not a conflict.
    order_history_service::update_order_history(&state, entry_id, pair()).await?;

    order_history_service::delete_order_history(&state, entry_id).await?;
    let recreated = order_history_service::create_order_history(&state, pair())
        .await?
        .data
        .expect("history");
    assert!(matches!(
        order_history_service::create_order_history(&state, pair()).await,
        Err(AppError::Conflict(_))
    ));

    let rows = OrderHistory::find()
        .filter(order_history::Column::OrderId.eq(order.id))
        .count(&state.orm)
        .await?;
    assert_eq!(rows, 1);

    let nested = order_history_service::get_order_history(
        &state,
        recreated.id,
        &Some("order.orderDetails.product".into()),
    )
    .await?
    .data
    .expect("history");
    assert!(nested.customer.is_none());
    let details = nested
        .order
        .and_then(|o| o.order_details)
        .expect("nested details");
    assert_eq!(details[0].product.as_ref().map(|p| p.id), Some(product_id));

    assert!(matches!(
        order_history_service::create_order_history(
            &state,
            OrderHistoryRequest {
                customer_id,
                order_id: i64::MAX,
            }
        )
        .await,
        Err(AppError::Validation(ref f)) if f.contains_key("order_id")
    ));

    order_service::delete_order(&state, order.id).await?;
    Ok(())
}

#[tokio::test]
async fn racing_duplicates_leave_one_winner() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let customer_id = create_customer(&state, "dana").await?;
    let product_id = create_product(&state, "Mug", money(900), 10).await?;
    let order = order_service::create_order(
        &state,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![LineItemRequest {
                product_id,
                quantity: 1,
                unit_price: money(900),
            }],
        },
    )
    .await?
    .data
    .expect("order");

    OrderHistory::delete_many()
        .filter(order_history::Column::OrderId.eq(order.id))
        .exec(&state.orm)
        .await?;

    let pair = || OrderHistoryRequest {
        customer_id,
        order_id: order.id,
    };
    let (first, second) = tokio::join!(
        order_history_service::create_order_history(&state, pair()),
        order_history_service::create_order_history(&state, pair()),
    );
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_))))
    );

    let username = unique("erin");
    let signup = |email: &str| CreateCustomerRequest {
        username: username.clone(),
        email: email.to_string(),
        password: "secret123".into(),
        address: None,
        phone_number: None,
    };
    let (first, second) = tokio::join!(
        customer_service::create_customer(&state, signup(&format!("{username}.a@example.com"))),
        customer_service::create_customer(&state, signup(&format!("{username}.b@example.com"))),
    );
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(
        |r| matches!(r, Err(AppError::Validation(f)) if f.contains_key("username"))
    ));

    order_service::delete_order(&state, order.id).await?;
    Ok(())
}
