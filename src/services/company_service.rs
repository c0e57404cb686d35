use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use validator::Validate;

use crate::{
    dto::companies::CompanyRequest,
    entity::companies::{ActiveModel, Column, Entity as Companies},
    error::{AppError, AppResult},
    models::CompanyResource,
    response::{ApiResponse, Meta, Page},
    routes::params::{ListQuery, search_term},
    state::AppState,
};

pub async fn list_companies(
    state: &AppState,
    query: ListQuery,
) -> AppResult<ApiResponse<Vec<CompanyResource>>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let mut finder = Companies::find();

    if let Some(term) = search_term(&query.search) {
        finder = finder.filter(
            Condition::any()
                .add(Column::Name.contains(&term))
                .add(Column::Email.contains(&term))
                .add(Column::Address.contains(&term))
                .add(Column::Website.contains(&term)),
        );
    }

    let finder = finder
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id);
    let total = finder.clone().count(&state.orm).await?;

    let items: Vec<CompanyResource> = finder
        .limit(per_page)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CompanyResource::from)
        .collect();

    let meta = Meta::new(page, per_page, total, items.len() as u64);
    Ok(Page { items, meta }.into_response("Companies"))
}

pub async fn get_company(state: &AppState, id: i64) -> AppResult<ApiResponse<CompanyResource>> {
    let company = Companies::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Company",
        CompanyResource::from(company),
        Some(Meta::empty()),
    ))
}

pub async fn create_company(
    state: &AppState,
    payload: CompanyRequest,
) -> AppResult<ApiResponse<CompanyResource>> {
    payload.validate()?;
    let company = ActiveModel {
        name: Set(payload.name),
        email: Set(payload.email),
        address: Set(payload.address),
        website: Set(payload.website),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(company_id = company.id, "company created");

    Ok(ApiResponse::success(
        "Company created",
        CompanyResource::from(company),
        Some(Meta::empty()),
    ))
}

pub async fn update_company(
    state: &AppState,
    id: i64,
    payload: CompanyRequest,
) -> AppResult<ApiResponse<CompanyResource>> {
    let existing = Companies::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    payload.validate()?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name);
    active.email = Set(payload.email);
    active.address = Set(payload.address);
    active.website = Set(payload.website);
    active.updated_at = Set(Utc::now().into());
    let company = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Company updated",
        CompanyResource::from(company),
        Some(Meta::empty()),
    ))
}

pub async fn delete_company(state: &AppState, id: i64) -> AppResult<()> {
    let result = Companies::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(company_id = id, "company deleted");
    Ok(())
}
