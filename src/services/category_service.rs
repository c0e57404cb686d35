use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use validator::Validate;

use crate::{
    dto::categories::CategoryRequest,
    entity::categories::{ActiveModel, Column, Entity as Categories, Model as CategoryModel},
    error::{
        AppError, AppResult, FieldErrors, duplicate_field, ensure_no_field_errors,
        on_unique_violation,
    },
    models::CategoryResource,
    response::{ApiResponse, Meta, Page},
    routes::params::{CategoryListQuery, parse_with, search_term},
    state::AppState,
};

pub const CATEGORY_RELATIONS: &[&str] = &["parent"];

fn wants_parent(with: &Option<String>) -> bool {
    parse_with(with, CATEGORY_RELATIONS).is_none_or(|names| names.contains(&"parent"))
}

async fn with_parents<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<CategoryModel>,
    load_parent: bool,
) -> AppResult<Vec<CategoryResource>> {
    let parents: HashMap<i64, CategoryModel> = if load_parent {
        let ids: HashSet<i64> = rows.iter().filter_map(|c| c.parent_id).collect();
        if ids.is_empty() {
            HashMap::new()
        } else {
            Categories::find()
                .filter(Column::Id.is_in(ids))
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
            let parent = row.parent_id.and_then(|id| parents.get(&id)).cloned();
            let mut resource = CategoryResource::from(row);
            resource.parent = parent.map(|p| Box::new(p.into()));
            resource
        })
        .collect())
}

pub async fn list_categories(
    state: &AppState,
    query: CategoryListQuery,
) -> AppResult<ApiResponse<Vec<CategoryResource>>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(term) = search_term(&query.search) {
        condition = condition.add(
            Condition::any()
                .add(Column::Name.contains(&term))
                .add(Column::Slug.contains(&term)),
        );
    }
    match query.parent_id {
        Some(0) => condition = condition.add(Column::ParentId.is_null()),
        Some(parent_id) => condition = condition.add(Column::ParentId.eq(parent_id)),
        None => {}
    }

    let finder = Categories::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder
        .limit(per_page)
        .offset(offset)
        .all(&state.orm)
        .await?;

    let items = with_parents(&state.orm, rows, wants_parent(&query.with)).await?;
    let meta = Meta::new(page, per_page, total, items.len() as u64);
    Ok(Page { items, meta }.into_response("Categories"))
}

/// Root categories ordered by name, unpaginated.
pub async fn list_root_categories(
    state: &AppState,
) -> AppResult<ApiResponse<Vec<CategoryResource>>> {
    let items = Categories::find()
        .filter(Column::ParentId.is_null())
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CategoryResource::from)
        .collect();
    Ok(ApiResponse::success(
        "Root categories",
        items,
        Some(Meta::empty()),
    ))
}

pub async fn get_category(
    state: &AppState,
    id: i64,
    with: &Option<String>,
) -> AppResult<ApiResponse<CategoryResource>> {
    let row = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let category = with_parents(&state.orm, vec![row], wants_parent(with))
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Category", category, Some(Meta::empty())))
}

/// True when following parent links from `start` arrives back at `target`.
async fn chain_reaches<C: ConnectionTrait>(conn: &C, start: i64, target: i64) -> AppResult<bool> {
    let mut seen = HashSet::new();
    let mut current = Some(start);
    while let Some(id) = current {
        if id == target {
            return Ok(true);
        }
        if !seen.insert(id) {
            // Pre-existing loop that does not involve `target`.
            return Ok(false);
        }
        current = Categories::find_by_id(id)
            .one(conn)
            .await?
            .and_then(|c| c.parent_id);
    }
    Ok(false)
}

async fn validate_category<C: ConnectionTrait>(
    conn: &C,
    payload: &CategoryRequest,
    self_id: Option<i64>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();

    let mut slug_taken = Categories::find().filter(Column::Slug.eq(payload.slug.as_str()));
    if let Some(id) = self_id {
        slug_taken = slug_taken.filter(Column::Id.ne(id));
    }
    if slug_taken.count(conn).await? > 0 {
        errors.insert(
            "slug".into(),
            vec!["The slug has already been taken.".into()],
        );
    }

    if let Some(parent_id) = payload.parent() {
        if Categories::find_by_id(parent_id).one(conn).await?.is_none() {
            errors.insert(
                "parent_id".into(),
                vec!["The selected parent id is invalid.".into()],
            );
        } else if let Some(id) = self_id {
            if chain_reaches(conn, parent_id, id).await? {
                errors.insert(
                    "parent_id".into(),
                    vec!["A category cannot be nested under itself or its descendants.".into()],
                );
            }
        }
    }

    ensure_no_field_errors(errors)
}

pub async fn create_category(
    state: &AppState,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<CategoryResource>> {
    payload.validate()?;
    validate_category(&state.orm, &payload, None).await?;

    let parent_id = payload.parent();
    let category = ActiveModel {
        name: Set(payload.name),
        slug: Set(payload.slug),
        parent_id: Set(parent_id),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|err| on_unique_violation(err, |msg| duplicate_field(msg, &["slug"])))?;

    tracing::info!(category_id = category.id, parent_id = ?category.parent_id, "category created");

    let resource = with_parents(&state.orm, vec![category], true)
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Category created",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    id: i64,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<CategoryResource>> {
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    payload.validate()?;
    validate_category(&state.orm, &payload, Some(id)).await?;

    let parent_id = payload.parent();
    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name);
    active.slug = Set(payload.slug);
    active.parent_id = Set(parent_id);
    active.updated_at = Set(Utc::now().into());
    let category = active
        .update(&state.orm)
        .await
        .map_err(|err| on_unique_violation(err, |msg| duplicate_field(msg, &["slug"])))?;

    let resource = with_parents(&state.orm, vec![category], true)
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Category updated",
        resource,
        Some(Meta::empty()),
    ))
}

/// Children become roots; products keep existing with `category_id` cleared by the FK.
pub async fn delete_category(state: &AppState, id: i64) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let category = Categories::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let orphaned = Categories::update_many()
        .col_expr(Column::ParentId, Expr::value(Option::<i64>::None))
        .col_expr(Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(Column::ParentId.eq(category.id))
        .exec(&txn)
        .await?;

    Categories::delete_by_id(category.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        category_id = id,
        children = orphaned.rows_affected,
        "category deleted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_is_loaded_unless_excluded() {
        assert!(wants_parent(&None));
        assert!(wants_parent(&Some("parent".into())));
        assert!(!wants_parent(&Some("children".into())));
    }
}
