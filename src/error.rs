// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // 400 Bad Request: user-correctable input (which field, which id)
    Validation(String),

    // 409 Conflict (duplicate username, email or slug)
    Conflict(String),

    // 401: unknown email and wrong password look the same
    InvalidCredentials,

    // 401: bad signature, malformed or expired token
    InvalidToken,

    // 401: no bearer token at all
    Unauthenticated,

    // 403: valid identity, insufficient privilege
    Forbidden,

    // 409: business rule block on `published`
    PublishPrecondition(String),

    // 502: object storage collaborator failed
    Upload(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Human-readable description.
    pub error: String,
    /// Machine-readable code, e.g. `VALIDATION_ERROR`.
    pub code: &'static str,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::PublishPrecondition(_) => StatusCode::CONFLICT,
            AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "TOKEN_INVALID",
            AppError::Unauthenticated => "TOKEN_MISSING",
            AppError::Forbidden => "FORBIDDEN",
            AppError::PublishPrecondition(_) => "PUBLISH_PRECONDITION",
            AppError::Upload(_) => "UPLOAD_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::InvalidCredentials => write!(f, "Invalid email or password"),
            AppError::InvalidToken => write!(f, "Invalid or expired token"),
            AppError::Unauthenticated => write!(f, "Authentication required"),
            AppError::Forbidden => write!(f, "Admin privileges required"),
            AppError::PublishPrecondition(msg) => write!(f, "{}", msg),
            AppError::Upload(msg) => write!(f, "Upload failed: {}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::InternalServerError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let error = match &self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Upload(msg) => {
                tracing::warn!("Object storage failure: {}", msg);
                self.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error, code })).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError`.
/// Unique violations (Postgres code 23505) become `Conflict`; everything else is internal.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let what = db_err.constraint().unwrap_or("unique constraint");
                return AppError::Conflict(format!("Duplicate value violates {}", what));
            }
        }
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
