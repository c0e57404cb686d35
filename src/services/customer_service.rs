use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use validator::Validate;

use crate::{
    dto::customers::{CreateCustomerRequest, UpdateCustomerRequest},
    entity::{
        customers::{ActiveModel as CustomerActive, Column as CustCol, Entity as Customers, Model as CustomerModel},
        order_details::{Column as OrderDetailCol, Entity as OrderDetails},
        order_history::Entity as OrderHistory,
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::{
        AppError, AppResult, FieldErrors, duplicate_field, ensure_no_field_errors,
        on_unique_violation,
    },
    export::{
        CSV_CONTENT_TYPE, FileDownload, PDF_CONTENT_TYPE, PdfDocument, cell, csv_bytes,
        timestamped_filename,
    },
    models::{CustomerResource, OrderHistoryResource, OrderResource},
    response::{ApiResponse, Meta, Page},
    routes::params::{ListQuery, SearchQuery, parse_with, search_term},
    services::stock::restore_stock_for,
    state::AppState,
};

pub const CUSTOMER_RELATIONS: &[&str] = &["orders", "orderHistory"];

const UNIQUE_FIELDS: &[&str] = &["username", "email"];

const CSV_HEADERS: &[&str] = &["ID", "Username", "Email", "Address", "Phone Number", "Created At"];

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn search_finder(search: &Option<String>) -> Select<Customers> {
    let mut finder = Customers::find();
    if let Some(term) = search_term(search) {
        finder = finder.filter(
            Condition::any()
                .add(CustCol::Username.contains(&term))
                .add(CustCol::Email.contains(&term))
                .add(CustCol::PhoneNumber.contains(&term)),
        );
    }
    finder
        .order_by_desc(CustCol::CreatedAt)
        .order_by_desc(CustCol::Id)
}

async fn load_customers<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<CustomerModel>,
    relations: &[&str],
) -> AppResult<Vec<CustomerResource>> {
    let mut orders = if relations.contains(&"orders") {
        Some(rows.load_many(Orders, conn).await?.into_iter())
    } else {
        None
    };
    let mut history = if relations.contains(&"orderHistory") {
        Some(rows.load_many(OrderHistory, conn).await?.into_iter())
    } else {
        None
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let mut resource = CustomerResource::from(row);
            if let Some(orders) = orders.as_mut() {
                resource.orders = Some(
                    orders
                        .next()
                        .unwrap_or_default()
                        .into_iter()
                        .map(OrderResource::from)
                        .collect(),
                );
            }
            if let Some(history) = history.as_mut() {
                resource.order_history = Some(
                    history
                        .next()
                        .unwrap_or_default()
                        .into_iter()
                        .map(OrderHistoryResource::from)
                        .collect(),
                );
            }
            resource
        })
        .collect())
}

pub async fn list_customers(
    state: &AppState,
    query: ListQuery,
) -> AppResult<ApiResponse<Vec<CustomerResource>>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let finder = search_finder(&query.search);
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder
        .limit(per_page)
        .offset(offset)
        .all(&state.orm)
        .await?;

    let relations = parse_with(&query.with, CUSTOMER_RELATIONS).unwrap_or_default();
    let items = load_customers(&state.orm, rows, &relations).await?;
    let meta = Meta::new(page, per_page, total, items.len() as u64);
    Ok(Page { items, meta }.into_response("Customers"))
}

pub async fn get_customer(
    state: &AppState,
    id: i64,
    with: &Option<String>,
) -> AppResult<ApiResponse<CustomerResource>> {
    let row = Customers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let relations = parse_with(with, CUSTOMER_RELATIONS).unwrap_or_default();
    let customer = load_customers(&state.orm, vec![row], &relations)
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Customer", customer, Some(Meta::empty())))
}

async fn check_unique<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    email: &str,
    exclude_id: Option<i64>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    for (field, column, value) in [
        ("username", CustCol::Username, username),
        ("email", CustCol::Email, email),
    ] {
        let mut finder = Customers::find().filter(column.eq(value));
        if let Some(id) = exclude_id {
            finder = finder.filter(CustCol::Id.ne(id));
        }
        if finder.count(conn).await? > 0 {
            errors.insert(
                field.to_string(),
                vec![format!("The {field} has already been taken.")],
            );
        }
    }
    ensure_no_field_errors(errors)
}

pub async fn create_customer(
    state: &AppState,
    payload: CreateCustomerRequest,
) -> AppResult<ApiResponse<CustomerResource>> {
    payload.validate()?;
    check_unique(&state.orm, &payload.username, &payload.email, None).await?;

    let customer = CustomerActive {
        username: Set(payload.username),
        email: Set(payload.email),
        password: Set(hash_password(&payload.password)?),
        address: Set(payload.address),
        phone_number: Set(payload.phone_number),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|err| on_unique_violation(err, |msg| duplicate_field(msg, UNIQUE_FIELDS)))?;

    tracing::info!(customer_id = customer.id, "customer created");

    Ok(ApiResponse::success(
        "Customer created",
        CustomerResource::from(customer),
        Some(Meta::empty()),
    ))
}

pub async fn update_customer(
    state: &AppState,
    id: i64,
    payload: UpdateCustomerRequest,
) -> AppResult<ApiResponse<CustomerResource>> {
    let existing = Customers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    payload.validate()?;
    check_unique(&state.orm, &payload.username, &payload.email, Some(id)).await?;

    let mut active: CustomerActive = existing.into();
    active.username = Set(payload.username);
    active.email = Set(payload.email);
    if let Some(password) = payload.password.as_deref() {
        active.password = Set(hash_password(password)?);
    }
    active.address = Set(payload.address);
    active.phone_number = Set(payload.phone_number);
    active.updated_at = Set(Utc::now().into());
    let customer = active
        .update(&state.orm)
        .await
        .map_err(|err| on_unique_violation(err, |msg| duplicate_field(msg, UNIQUE_FIELDS)))?;

    Ok(ApiResponse::success(
        "Customer updated",
        CustomerResource::from(customer),
        Some(Meta::empty()),
    ))
}

/// Restores stock held by the customer's orders, then removes the customer.
pub async fn delete_customer(state: &AppState, id: i64) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let customer = Customers::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let order_ids: Vec<i64> = Orders::find()
        .select_only()
        .column(OrderCol::Id)
        .filter(OrderCol::CustomerId.eq(customer.id))
        .into_tuple::<i64>()
        .all(&txn)
        .await?;

    if !order_ids.is_empty() {
        let details = OrderDetails::find()
            .filter(OrderDetailCol::OrderId.is_in(order_ids.clone()))
            .all(&txn)
            .await?;
        restore_stock_for(&txn, &details).await?;
    }

    // Orders, their details and history rows cascade from the customer.
    Customers::delete_by_id(customer.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(customer_id = id, orders = order_ids.len(), "customer deleted");
    Ok(())
}

fn csv_row(customer: &CustomerModel) -> Vec<String> {
    vec![
        customer.id.to_string(),
        customer.username.clone(),
        customer.email.clone(),
        customer.address.clone().unwrap_or_default(),
        customer.phone_number.clone().unwrap_or_default(),
        customer.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

pub async fn export_customers_csv(state: &AppState, query: SearchQuery) -> AppResult<FileDownload> {
    let rows = search_finder(&query.search).all(&state.orm).await?;
    let bytes = csv_bytes(CSV_HEADERS, rows.iter().map(csv_row))?;
    tracing::debug!(rows = rows.len(), "customers exported to csv");
    Ok(FileDownload {
        filename: timestamped_filename("customers", "csv", Utc::now()),
        content_type: CSV_CONTENT_TYPE,
        bytes,
    })
}

pub async fn export_customers_pdf(state: &AppState, query: SearchQuery) -> AppResult<FileDownload> {
    let rows = search_finder(&query.search).all(&state.orm).await?;
    let now = Utc::now();
    let doc = customers_document(&rows, search_term(&query.search).as_deref(), now);
    Ok(FileDownload {
        filename: timestamped_filename("customers", "pdf", now),
        content_type: PDF_CONTENT_TYPE,
        bytes: doc.render(),
    })
}

fn customers_document(
    rows: &[CustomerModel],
    search: Option<&str>,
    generated_at: chrono::DateTime<Utc>,
) -> PdfDocument {
    let mut doc = PdfDocument::new("Customers");
    doc.line(format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S")));
    if let Some(search) = search {
        doc.line(format!("Search: {search}"));
    }
    doc.line(format!("Total customers: {}", rows.len())).blank();
    doc.line(format!(
        "{} {} {} {}",
        cell("ID", 6),
        cell("Username", 22),
        cell("Email", 32),
        "Phone Number"
    ));
    for row in rows {
        doc.line(format!(
            "{} {} {} {}",
            cell(&row.id.to_string(), 6),
            cell(&row.username, 22),
            cell(&row.email, 32),
            row.phone_number.as_deref().unwrap_or("-")
        ));
    }
    doc
}
