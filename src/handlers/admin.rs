// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{AppError, ErrorBody},
    models::{
        media::MediaReference,
        post::{BlogPost, PostForm, PostPatch, PostQuery, StatusRequest},
    },
    services::{guard::Identity, media::MediaManager, posts::PostManager},
};

/// Lists posts in any status for the dashboard.
/// Admin only.
#[utoipa::path(
    get,
    path = "/api/admin/posts",
    tag = "Admin",
    params(
        ("status" = Option<String>, Query, description = "`draft` or `published`"),
        ("category" = Option<String>, Query),
        ("tag" = Option<String>, Query),
        ("cursor" = Option<String>, Query),
        ("limit" = Option<i64>, Query),
    ),
    responses(
        (status = 200, description = "Posts, newest first", body = [BlogPost]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn list_posts(
    State(posts): State<PostManager>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<PostQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.list_all(&identity, params).await?))
}

/// Creates a new post. It is stored as a draft unless both locales are complete.
/// Admin only.
#[utoipa::path(
    post,
    path = "/api/admin/posts",
    tag = "Admin",
    request_body = PostForm,
    responses(
        (status = 201, description = "Post created", body = BlogPost),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 409, description = "Slug already exists", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn create_post(
    State(posts): State<PostManager>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<PostForm>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Gets any post by ID.
/// Admin only.
#[utoipa::path(
    get,
    path = "/api/admin/posts/{id}",
    tag = "Admin",
    params(("id" = i64, Path)),
    responses(
        (status = 200, description = "The post", body = BlogPost),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn get_post(
    State(posts): State<PostManager>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.get(&identity, id).await?))
}

/// Updates a post by ID. Fields are optional; the slug never changes.
/// Admin only.
#[utoipa::path(
    put,
    path = "/api/admin/posts/{id}",
    tag = "Admin",
    params(("id" = i64, Path)),
    request_body = PostPatch,
    responses(
        (status = 200, description = "Updated post", body = BlogPost),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 409, description = "Update would break a published post", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn update_post(
    State(posts): State<PostManager>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(payload): Json<PostPatch>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.update(&identity, id, payload).await?))
}

/// Publishes or unpublishes a post.
/// Admin only.
#[utoipa::path(
    patch,
    path = "/api/admin/posts/{id}/status",
    tag = "Admin",
    params(("id" = i64, Path)),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Post with its new status", body = BlogPost),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 409, description = "Both locales must have a title and body", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn set_post_status(
    State(posts): State<PostManager>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.set_status(&identity, id, payload.status).await?))
}

/// Deletes a post by ID. Its images are released in the background.
/// Admin only.
#[utoipa::path(
    delete,
    path = "/api/admin/posts/{id}",
    tag = "Admin",
    params(("id" = i64, Path)),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn delete_post(
    State(posts): State<PostManager>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    posts.delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Uploads an image (multipart field `file`) and returns its media reference.
/// Admin only.
#[utoipa::path(
    post,
    path = "/api/admin/media",
    tag = "Admin",
    responses(
        (status = 201, description = "Stored", body = MediaReference),
        (status = 400, description = "Missing file or not an image", body = ErrorBody),
        (status = 502, description = "Object storage failed", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn upload_media(
    State(media): State<MediaManager>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let reference = media.upload(bytes.to_vec(), &content_type).await?;
        return Ok((StatusCode::CREATED, Json(reference)));
    }

    Err(AppError::Validation(
        "Multipart field 'file' is required".to_string(),
    ))
}
