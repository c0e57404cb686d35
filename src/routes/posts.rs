use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::posts::{PostRequest, PostStats, PostStatus},
    error::AppResult,
    middleware::{auth::AuthUser, extract::{JsonBody, QueryParams}},
    models::PostResource,
    response::ApiResponse,
    routes::params::{Pagination, PostListQuery},
    services::post_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/mine", get(my_posts))
        .route("/stats", get(post_stats))
        .route(
            "/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/{id}/publish", post(publish_post))
        .route("/{id}/archive", post(archive_post))
}

#[utoipa::path(
    get,
    path = "/api/posts",
    params(PostListQuery),
    responses(
        (status = 200, description = "List posts with excerpt and read time", body = ApiResponse<Vec<PostResource>>)
    ),
    tag = "Posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PostListQuery>,
) -> AppResult<Json<ApiResponse<Vec<PostResource>>>> {
    let resp = post_service::list_posts(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/posts/mine",
    params(Pagination),
    responses(
        (status = 200, description = "Posts written by the caller", body = ApiResponse<Vec<PostResource>>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn my_posts(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(pagination): QueryParams<Pagination>,
) -> AppResult<Json<ApiResponse<Vec<PostResource>>>> {
    let resp = post_service::list_my_posts(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/posts/stats",
    responses(
        (status = 200, description = "Post counts by status", body = ApiResponse<PostStats>)
    ),
    tag = "Posts"
)]
pub async fn post_stats(State(state): State<AppState>) -> AppResult<Json<ApiResponse<PostStats>>> {
    let resp = post_service::post_stats(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<PostResource>),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<PostRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostResource>>)> {
    let resp = post_service::create_post(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Get post", body = ApiResponse<PostResource>),
        (status = 404, description = "Post not found")
    ),
    tag = "Posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<PostResource>>> {
    let resp = post_service::get_post(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<PostResource>),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<PostRequest>,
) -> AppResult<Json<ApiResponse<PostResource>>> {
    let resp = post_service::update_post(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    post_service::delete_post(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/publish",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post published", body = ApiResponse<PostResource>),
        (status = 400, description = "Already published"),
        (status = 403, description = "Not the author")
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn publish_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<PostResource>>> {
    let resp = post_service::transition_post(&state, &user, id, PostStatus::Published).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/archive",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post archived", body = ApiResponse<PostResource>),
        (status = 400, description = "Already archived"),
        (status = 403, description = "Not the author")
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn archive_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<PostResource>>> {
    let resp = post_service::transition_post(&state, &user, id, PostStatus::Archived).await?;
    Ok(Json(resp))
}
