mod common;

use std::sync::Arc;
use std::time::Duration;

use storefront_admin_api::{
    cache::MemoryCache,
    dto::{
        auth::{LoginRequest, RegisterRequest},
        posts::{PostRequest, PostStatus},
    },
    error::AppError,
    middleware::auth::{ADMIN_ROLE, AuthUser, decode_token},
    routes::params::{Pagination, PostListQuery},
    services::{auth_service, post_service},
};

use common::{JWT_SECRET, test_state, unique};

#[tokio::test]
async fn post_lifecycle_with_ownership_and_cache() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let cache = Arc::new(MemoryCache::new(Duration::from_secs(60)));
    let state = state.with_cache(cache.clone());

    let email = format!("{}@example.com", unique("author"));
    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Author".into(),
            email: email.clone(),
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .expect("user");

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email,
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .expect("token");
    let token = login.token.strip_prefix("Bearer ").expect("bearer prefix");
    let author: AuthUser = decode_token(token, JWT_SECRET)?;
    assert_eq!(author.user_id, registered.id);

    let title = unique("Lifecycle post");
    let post = post_service::create_post(
        &state,
        &author,
        PostRequest {
            title: title.clone(),
            content: "<p>Some content long enough to pass.</p>".into(),
            status: None,
            published_at: None,
        },
    )
    .await?
    .data
    .expect("post");
    assert_eq!(post.status, "draft");
    assert!(post.published_at.is_none());
    assert_eq!(post.user.as_ref().map(|u| u.id), Some(author.user_id));

    // Listings are cached until the next write.
    post_service::list_posts(&state, PostListQuery::default()).await?;
    post_service::list_my_posts(&state, &author, Pagination::default()).await?;
    assert!(!cache.is_empty());

    let published = post_service::transition_post(&state, &author, post.id, PostStatus::Published)
        .await?
        .data
        .expect("post");
    assert!(cache.is_empty());
    let first_published_at = published.published_at.expect("published_at set");

    assert!(matches!(
        post_service::transition_post(&state, &author, post.id, PostStatus::Published).await,
        Err(AppError::BadRequest(_))
    ));

    let archived = post_service::transition_post(&state, &author, post.id, PostStatus::Archived)
        .await?
        .data
        .expect("post");
    assert_eq!(archived.status, "archived");
    assert_eq!(archived.published_at, Some(first_published_at));

    let republished =
        post_service::transition_post(&state, &author, post.id, PostStatus::Published)
            .await?
            .data
            .expect("post");
    assert_eq!(republished.published_at, Some(first_published_at));

    let mine = post_service::list_my_posts(&state, &author, Pagination::default())
        .await?
        .data
        .expect("posts");
    let listed = mine.iter().find(|p| p.id == post.id).expect("own post listed");
    assert_eq!(listed.excerpt.as_deref(), Some("Some content long enough to pass."));
    assert_eq!(listed.read_time, Some(1));

    // Only the author or an admin may write.
    let stranger = AuthUser {
        user_id: author.user_id + 1_000_000,
        role: "user".into(),
    };
    assert!(matches!(
        post_service::delete_post(&state, &stranger, post.id).await,
        Err(AppError::Forbidden)
    ));
    let admin = AuthUser {
        user_id: stranger.user_id,
        role: ADMIN_ROLE.into(),
    };
    post_service::update_post(
        &state,
        &admin,
        post.id,
        PostRequest {
            title: title.clone(),
            content: "Edited by an administrator.".into(),
            status: Some("published".into()),
            published_at: None,
        },
    )
    .await?;

    let duplicate = post_service::create_post(
        &state,
        &author,
        PostRequest {
            title,
            content: "Another body of text.".into(),
            status: Some("published".into()),
            published_at: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Validation(ref f)) if f.contains_key("title")));

    let stats = post_service::post_stats(&state).await?.data.expect("stats");
    assert!(stats.published >= 1);
    assert_eq!(stats.total, stats.published + stats.draft + stats.archived);

    post_service::delete_post(&state, &author, post.id).await?;
    assert!(matches!(
        post_service::get_post(&state, post.id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}
