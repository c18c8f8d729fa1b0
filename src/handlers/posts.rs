// src/handlers/posts.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{AppError, ErrorBody},
    models::post::{BlogPost, PostQuery},
    services::posts::PostManager,
};

/// Lists published posts, newest first.
/// Supports cursor-based pagination and category/tag filters.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    params(
        ("category" = Option<String>, Query, description = "Registry category id"),
        ("tag" = Option<String>, Query),
        ("cursor" = Option<String>, Query, description = "createdAt of the last post of the previous page"),
        ("limit" = Option<i64>, Query, description = "Default 20, max 100"),
    ),
    responses((status = 200, description = "Published posts", body = [BlogPost]))
)]
pub async fn list_posts(
    State(posts): State<PostManager>,
    Query(params): Query<PostQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.list_published(params).await?))
}

/// Get a single published post by slug.
#[utoipa::path(
    get,
    path = "/api/posts/{slug}",
    tag = "Posts",
    params(("slug" = String, Path)),
    responses(
        (status = 200, description = "The post", body = BlogPost),
        (status = 404, description = "No published post with this slug", body = ErrorBody),
    )
)]
pub async fn get_post(
    State(posts): State<PostManager>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.get_published(&slug).await?))
}

/// Counts one view of a published post.
#[utoipa::path(
    post,
    path = "/api/posts/{slug}/views",
    tag = "Posts",
    params(("slug" = String, Path)),
    responses(
        (status = 204, description = "View counted"),
        (status = 404, description = "No published post with this slug", body = ErrorBody),
    )
)]
pub async fn record_view(
    State(posts): State<PostManager>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.get_published(&slug).await?;
    posts.record_view(post.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
