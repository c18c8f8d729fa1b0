// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    error::{AppError, ErrorBody},
    models::user::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest},
    services::{guard::Identity, session::SessionAuthenticator},
};

/// Registers a new user.
///
/// Hashes the password before storing it and returns a 30-day token.
/// Duplicate usernames or emails are reported as 400.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Invalid input or duplicate account", body = ErrorBody),
    )
)]
pub async fn register(
    State(sessions): State<SessionAuthenticator>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = sessions.register(payload).await.map_err(|e| match e {
        AppError::Conflict(msg) => AppError::Validation(msg),
        other => other,
    })?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Authenticates a user and returns a 7-day JWT.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
    )
)]
pub async fn login(
    State(sessions): State<SessionAuthenticator>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = sessions.login(payload).await?;
    Ok(Json(response))
}

/// Returns the caller's own account.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn me(
    State(sessions): State<SessionAuthenticator>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.current_user(&identity).await?))
}

/// Updates the caller's username, email or password.
#[utoipa::path(
    put,
    path = "/api/auth/me",
    tag = "Auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = PublicUser),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 409, description = "Username or email taken", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn update_me(
    State(sessions): State<SessionAuthenticator>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.update_profile(&identity, payload).await?))
}
