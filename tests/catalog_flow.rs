mod common;

use storefront_admin_api::{
    dto::{
        categories::CategoryRequest,
        orders::{LineItemRequest, OrderRequest},
        products::UpdateProductRequest,
    },
    error::AppError,
    routes::params::{CategoryListQuery, ProductListQuery},
    services::{category_service, order_service, product_service},
};

use common::{create_customer, create_product, money, test_state, unique};

fn category(name: &str, parent_id: Option<i64>) -> CategoryRequest {
    let slug = unique(name).to_lowercase();
    CategoryRequest {
        name: name.into(),
        slug,
        parent_id,
    }
}

#[tokio::test]
async fn category_tree_rejects_cycles_and_orphans_children() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let root = category_service::create_category(&state, category("Apparel", None))
        .await?
        .data
        .expect("root");
    let child = category_service::create_category(&state, category("Hoodies", Some(root.id)))
        .await?
        .data
        .expect("child");
    assert_eq!(child.parent.as_ref().map(|p| p.id), Some(root.id));
    let grandchild =
        category_service::create_category(&state, category("Zip hoodies", Some(child.id)))
            .await?
            .data
            .expect("grandchild");

    // Re-parenting the root under its own grandchild would close a loop.
    let cycle = category_service::update_category(
        &state,
        root.id,
        CategoryRequest {
            name: root.name.clone(),
            slug: root.slug.clone(),
            parent_id: Some(grandchild.id),
        },
    )
    .await;
    assert!(matches!(cycle, Err(AppError::Validation(ref f)) if f.contains_key("parent_id")));

    let own_parent = category_service::update_category(
        &state,
        child.id,
        CategoryRequest {
            name: child.name.clone(),
            slug: child.slug.clone(),
            parent_id: Some(child.id),
        },
    )
    .await;
    assert!(matches!(own_parent, Err(AppError::Validation(ref f)) if f.contains_key("parent_id")));

    let taken = category_service::create_category(
        &state,
        CategoryRequest {
            name: "Copy".into(),
            slug: child.slug.clone(),
            parent_id: Some(0),
        },
    )
    .await;
    assert!(matches!(taken, Err(AppError::Validation(ref f)) if f.contains_key("slug")));

    let children = category_service::list_categories(
        &state,
        CategoryListQuery {
            parent_id: Some(root.id),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("children");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);

    category_service::delete_category(&state, child.id).await?;
    let orphan = category_service::get_category(&state, grandchild.id, &None)
        .await?
        .data
        .expect("grandchild");
    assert_eq!(orphan.parent_id, None);
    assert!(orphan.parent.is_none());

    let roots = category_service::list_root_categories(&state)
        .await?
        .data
        .expect("roots");
    assert!(roots.iter().any(|c| c.id == grandchild.id));

    category_service::delete_category(&state, grandchild.id).await?;
    category_service::delete_category(&state, root.id).await?;
    assert!(matches!(
        category_service::get_category(&state, root.id, &None).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn soft_deleted_products_disappear_but_block_new_orders() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let customer_id = create_customer(&state, "carol").await?;
    let product_id = create_product(&state, "Kettle", money(2500), 4).await?;

    let renamed = product_service::update_product(
        &state,
        product_id,
        UpdateProductRequest {
            stock_quantity: Some(6),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(renamed.stock_quantity, 6);
    assert_eq!(renamed.price, money(2500));

    product_service::delete_product(&state, product_id).await?;
    assert!(matches!(
        product_service::get_product(&state, product_id, &None).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        product_service::delete_product(&state, product_id).await,
        Err(AppError::NotFound)
    ));

    let listed = product_service::list_products(
        &state,
        ProductListQuery {
            search: Some("Kettle".into()),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products");
    assert!(listed.iter().all(|p| p.id != product_id));

    let order = order_service::create_order(
        &state,
        OrderRequest {
            customer_id,
            order_date: None,
            total_price: None,
            order_details: vec![LineItemRequest {
                product_id,
                quantity: 1,
                unit_price: money(2500),
            }],
        },
    )
    .await;
    assert!(matches!(
        order,
        Err(AppError::Validation(ref f)) if f.contains_key("order_details.0.product_id")
    ));
    Ok(())
}
