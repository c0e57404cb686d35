use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use validator::Validate;

use crate::{
    dto::products::{CreateProductRequest, UpdateProductRequest},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::ProductResource,
    response::{ApiResponse, Meta, Page},
    routes::params::{ProductListQuery, parse_with, search_term},
    state::AppState,
};

pub const PRODUCT_RELATIONS: &[&str] = &["category"];

fn wants_category(with: &Option<String>) -> bool {
    parse_with(with, PRODUCT_RELATIONS).is_some_and(|names| names.contains(&"category"))
}

async fn with_categories<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<ProductModel>,
    load_category: bool,
) -> AppResult<Vec<ProductResource>> {
    let categories = if load_category {
        let ids: HashSet<i64> = rows.iter().filter_map(|p| p.category_id).collect();
        if ids.is_empty() {
            HashMap::new()
        } else {
            Categories::find()
                .filter(CategoryCol::Id.is_in(ids))
                .all(conn)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        }
    } else {
        HashMap::new()
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let category = row.category_id.and_then(|id| categories.get(&id)).cloned();
            let mut resource = ProductResource::from(row);
            resource.category = category.map(Into::into);
            resource
        })
        .collect())
}

async fn find_live<C: ConnectionTrait>(conn: &C, id: i64) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .filter(Column::DeletedAt.is_null())
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn ensure_category<C: ConnectionTrait>(conn: &C, category_id: Option<i64>) -> AppResult<()> {
    if let Some(id) = category_id {
        if Categories::find_by_id(id).one(conn).await?.is_none() {
            return Err(AppError::invalid(
                "category_id",
                "The selected category id is invalid.",
            ));
        }
    }
    Ok(())
}

pub async fn list_products(
    state: &AppState,
    query: ProductListQuery,
) -> AppResult<ApiResponse<Vec<ProductResource>>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::DeletedAt.is_null());

    if let Some(term) = search_term(&query.search) {
        condition = condition.add(
            Condition::any()
                .add(Column::Title.contains(&term))
                .add(Column::Description.contains(&term)),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id);

    let total = finder.clone().count(&state.orm).await?;

    let rows = finder
        .limit(per_page)
        .offset(offset)
        .all(&state.orm)
        .await?;

    let items = with_categories(&state.orm, rows, wants_category(&query.with)).await?;
    let meta = Meta::new(page, per_page, total, items.len() as u64);
    Ok(Page { items, meta }.into_response("Products"))
}

pub async fn get_product(
    state: &AppState,
    id: i64,
    with: &Option<String>,
) -> AppResult<ApiResponse<ProductResource>> {
    let row = find_live(&state.orm, id).await?;
    let product = with_categories(&state.orm, vec![row], wants_category(with))
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, Some(Meta::empty())))
}

pub async fn create_product(
    state: &AppState,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductResource>> {
    payload.validate()?;
    ensure_category(&state.orm, payload.category_id).await?;

    let product = ActiveModel {
        title: Set(payload.title),
        description: Set(payload.description),
        image: Set(payload.image),
        price: Set(payload.price),
        sales_off: Set(payload.sales_off),
        low_price: Set(payload.low_price),
        stock_quantity: Set(payload.stock_quantity),
        category_id: Set(payload.category_id),
        active: Set(payload.active),
        status: Set(payload.status),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = product.id, stock = product.stock_quantity, "product created");

    Ok(ApiResponse::success(
        "Product created",
        ProductResource::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    id: i64,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductResource>> {
    let existing = find_live(&state.orm, id).await?;
    payload.validate()?;
    ensure_category(&state.orm, payload.category_id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(image) = payload.image {
        active.image = Set(image);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if payload.sales_off.is_some() {
        active.sales_off = Set(payload.sales_off);
    }
    if payload.low_price.is_some() {
        active.low_price = Set(payload.low_price);
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if payload.category_id.is_some() {
        active.category_id = Set(payload.category_id);
    }
    if let Some(flag) = payload.active {
        active.active = Set(flag);
    }
    if let Some(flag) = payload.status {
        active.status = Set(flag);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Product updated",
        ProductResource::from(product),
        Some(Meta::empty()),
    ))
}

/// Soft delete: the row stays so historical order details still resolve it.
pub async fn delete_product(state: &AppState, id: i64) -> AppResult<()> {
    let existing = find_live(&state.orm, id).await?;

    let now = Utc::now();
    let mut active: ActiveModel = existing.into();
    active.deleted_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    active.update(&state.orm).await?;

    tracing::info!(product_id = id, "product soft-deleted");
    Ok(())
}
