// src/middleware.rs

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    services::{
        guard::{Capability, authorize},
        session::SessionAuthenticator,
    },
};

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects the
/// resolved `Identity` into the request extensions for handlers to use.
/// Missing token: 401 TOKEN_MISSING. Bad or expired token: 401 TOKEN_INVALID.
pub async fn require_authenticated(
    State(sessions): State<SessionAuthenticator>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authorize(req.headers(), Capability::Authenticated, &sessions)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Same as `require_authenticated`, then 403 unless the token carries the admin flag.
pub async fn require_admin(
    State(sessions): State<SessionAuthenticator>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authorize(req.headers(), Capability::Admin, &sessions)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
