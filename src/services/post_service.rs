use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use validator::Validate;

use crate::{
    dto::posts::{PostRequest, PostStats, PostStatus},
    entity::{
        posts::{ActiveModel, Column, Entity as Posts, Model as PostModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult, duplicate_field, on_unique_violation},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{PostResource, UserSummary},
    response::{ApiResponse, Meta, Page},
    routes::params::{Pagination, PostListQuery, search_term},
    state::AppState,
};

pub const CACHE_TAG: &str = "posts";

async fn with_authors<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<PostModel>,
) -> AppResult<Vec<PostResource>> {
    let authors = rows.load_one(Users, conn).await?;
    Ok(rows
        .into_iter()
        .zip(authors)
        .map(|(row, author)| {
            let mut resource = PostResource::from(row);
            resource.user = author.map(UserSummary::from);
            resource
        })
        .collect())
}

async fn paginate(
    state: &AppState,
    finder: Select<Posts>,
    pagination: &Pagination,
) -> AppResult<Page<PostResource>> {
    let (page, per_page, offset) = pagination.normalize();
    let total = finder.clone().count(&state.orm).await?;
    let rows = finder
        .limit(per_page)
        .offset(offset)
        .all(&state.orm)
        .await?;
    let items: Vec<PostResource> = with_authors(&state.orm, rows)
        .await?
        .into_iter()
        .map(PostResource::with_listing_fields)
        .collect();
    let meta = Meta::new(page, per_page, total, items.len() as u64);
    Ok(Page { items, meta })
}

/// Serves a page from the listing cache, computing and storing it on a miss.
async fn cached_page(
    state: &AppState,
    key: String,
    finder: Select<Posts>,
    pagination: &Pagination,
) -> AppResult<Page<PostResource>> {
    if let Some(value) = state.cache.get(&key) {
        match serde_json::from_value::<Page<PostResource>>(value) {
            Ok(page) => {
                tracing::debug!(key = %key, "post listing cache hit");
                return Ok(page);
            }
            Err(err) => tracing::warn!(error = %err, key = %key, "discarding unreadable cache entry"),
        }
    }

    let generation = state.cache.generation(CACHE_TAG);
    let page = paginate(state, finder, pagination).await?;
    match serde_json::to_value(&page) {
        Ok(value) => state.cache.set(&key, CACHE_TAG, generation, value),
        Err(err) => tracing::warn!(error = %err, key = %key, "post listing not cached"),
    }
    Ok(page)
}

fn cache_key(listing: &str, pagination: &Pagination) -> String {
    let (page, per_page, _) = pagination.normalize();
    format!("posts.{listing}.{per_page}.{page}")
}

pub async fn list_posts(
    state: &AppState,
    query: PostListQuery,
) -> AppResult<ApiResponse<Vec<PostResource>>> {
    let pagination = query.pagination();
    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status.as_str()));
    }
    let search = search_term(&query.search);
    if let Some(term) = search.as_deref() {
        condition = condition.add(
            Condition::any()
                .add(Column::Title.contains(term))
                .add(Column::Content.contains(term)),
        );
    }

    let mut finder = Posts::find().filter(condition);
    finder = if query.status == Some(PostStatus::Published) {
        finder.order_by_desc(Column::PublishedAt)
    } else {
        finder.order_by_desc(Column::CreatedAt)
    };
    let finder = finder.order_by_desc(Column::Id);

    let page = if search.is_some() {
        paginate(state, finder, &pagination).await?
    } else {
        let listing = query.status.map_or("all", |s| s.as_str());
        cached_page(state, cache_key(listing, &pagination), finder, &pagination).await?
    };
    Ok(page.into_response("Posts"))
}

pub async fn list_my_posts(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<PostResource>>> {
    let finder = Posts::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id);
    let key = cache_key(&format!("user.{}", user.user_id), &pagination);
    let page = cached_page(state, key, finder, &pagination).await?;
    Ok(page.into_response("My posts"))
}

pub async fn post_stats(state: &AppState) -> AppResult<ApiResponse<PostStats>> {
    let count_status = |status: PostStatus| {
        Posts::find()
            .filter(Column::Status.eq(status.as_str()))
            .count(&state.orm)
    };

    let now = Utc::now();
    let month_start = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid month start")))?;

    let stats = PostStats {
        total: Posts::find().count(&state.orm).await?,
        published: count_status(PostStatus::Published).await?,
        draft: count_status(PostStatus::Draft).await?,
        archived: count_status(PostStatus::Archived).await?,
        this_month: Posts::find()
            .filter(Column::CreatedAt.gte(month_start))
            .count(&state.orm)
            .await?,
    };
    Ok(ApiResponse::success("Post stats", stats, Some(Meta::empty())))
}

async fn find_post<C: ConnectionTrait>(conn: &C, id: i64) -> AppResult<PostModel> {
    Posts::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn to_resource<C: ConnectionTrait>(conn: &C, post: PostModel) -> AppResult<PostResource> {
    with_authors(conn, vec![post])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

pub async fn get_post(state: &AppState, id: i64) -> AppResult<ApiResponse<PostResource>> {
    let post = find_post(&state.orm, id).await?;
    let resource = to_resource(&state.orm, post).await?;
    Ok(ApiResponse::success("Post", resource, Some(Meta::empty())))
}

async fn ensure_title_free<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    exclude_id: Option<i64>,
) -> AppResult<()> {
    let mut finder = Posts::find().filter(Column::Title.eq(title));
    if let Some(id) = exclude_id {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.count(conn).await? > 0 {
        return Err(AppError::invalid("title", "The title has already been taken."));
    }
    Ok(())
}

fn invalidate(state: &AppState) {
    state.cache.invalidate_tag(CACHE_TAG);
}

pub async fn create_post(
    state: &AppState,
    user: &AuthUser,
    payload: PostRequest,
) -> AppResult<ApiResponse<PostResource>> {
    payload.validate()?;
    ensure_title_free(&state.orm, &payload.title, None).await?;

    let status = payload.status().unwrap_or(PostStatus::Draft);
    let published_at = match (status, payload.published_at) {
        (_, Some(at)) => Some(at),
        (PostStatus::Published, None) => Some(Utc::now()),
        _ => None,
    };

    let post = ActiveModel {
        title: Set(payload.title),
        content: Set(payload.content),
        status: Set(status.as_str().to_string()),
        published_at: Set(published_at.map(Into::into)),
        user_id: Set(user.user_id),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|err| on_unique_violation(err, |msg| duplicate_field(msg, &["title"])))?;

    invalidate(state);
    tracing::info!(post_id = post.id, user_id = user.user_id, status = %post.status, "post created");

    let resource = to_resource(&state.orm, post).await?;
    Ok(ApiResponse::success(
        "Post created",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn update_post(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: PostRequest,
) -> AppResult<ApiResponse<PostResource>> {
    let existing = find_post(&state.orm, id).await?;
    ensure_owner_or_admin(user, existing.user_id)?;
    payload.validate()?;
    ensure_title_free(&state.orm, &payload.title, Some(id)).await?;

    let status = payload
        .status()
        .or_else(|| PostStatus::parse(&existing.status))
        .unwrap_or(PostStatus::Draft);
    let published_at: Option<DateTimeWithTimeZone> =
        match (status, payload.published_at, existing.published_at) {
            (_, Some(at), _) => Some(at.into()),
            (PostStatus::Published, None, None) => Some(Utc::now().into()),
            (_, None, current) => current,
        };

    let mut active: ActiveModel = existing.into();
    active.title = Set(payload.title);
    active.content = Set(payload.content);
    active.status = Set(status.as_str().to_string());
    active.published_at = Set(published_at);
    active.updated_at = Set(Utc::now().into());
    let post = active
        .update(&state.orm)
        .await
        .map_err(|err| on_unique_violation(err, |msg| duplicate_field(msg, &["title"])))?;

    invalidate(state);

    let resource = to_resource(&state.orm, post).await?;
    Ok(ApiResponse::success(
        "Post updated",
        resource,
        Some(Meta::empty()),
    ))
}

pub async fn delete_post(state: &AppState, user: &AuthUser, id: i64) -> AppResult<()> {
    let existing = find_post(&state.orm, id).await?;
    ensure_owner_or_admin(user, existing.user_id)?;

    Posts::delete_by_id(existing.id).exec(&state.orm).await?;
    invalidate(state);

    tracing::info!(post_id = id, user_id = user.user_id, "post deleted");
    Ok(())
}

/// Moves a post along its lifecycle; `published_at` is only ever set once.
pub async fn transition_post(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    next: PostStatus,
) -> AppResult<ApiResponse<PostResource>> {
    let existing = find_post(&state.orm, id).await?;
    ensure_owner_or_admin(user, existing.user_id)?;

    let current = PostStatus::parse(&existing.status).unwrap_or(PostStatus::Draft);
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Post cannot move from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    let stamp_publish = next == PostStatus::Published && existing.published_at.is_none();
    let now = Utc::now();
    let mut active: ActiveModel = existing.into();
    active.status = Set(next.as_str().to_string());
    if stamp_publish {
        active.published_at = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    let post = active.update(&state.orm).await?;

    invalidate(state);
    tracing::info!(post_id = post.id, from = current.as_str(), to = next.as_str(), "post status changed");

    let message = match next {
        PostStatus::Published => "Post published",
        PostStatus::Archived => "Post archived",
        PostStatus::Draft => "Post updated",
    };
    let resource = to_resource(&state.orm, post).await?;
    Ok(ApiResponse::success(message, resource, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_uses_normalized_paging() {
        let pagination = Pagination::new(Some(2), Some(500));
        assert_eq!(cache_key("all", &pagination), "posts.all.100.2");
        assert_eq!(
            cache_key("published", &Pagination::default()),
            "posts.published.15.1"
        );
    }
}
