//! Capability checks on bearer tokens.

use axum::http::{HeaderMap, header};
use serde::Serialize;

use crate::{error::AppError, services::session::SessionAuthenticator};

/// Named permission level required by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Authenticated,
    Admin,
}

/// Who is calling, as proven by a valid session token.
///
/// `is_admin` is the flag captured when the token was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Identity {
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        match capability {
            Capability::Authenticated => Ok(()),
            Capability::Admin if self.is_admin => Ok(()),
            Capability::Admin => Err(AppError::Forbidden),
        }
    }
}

/// Extracts the raw token from `Authorization: Bearer <token>`.
///
/// `Ok(None)` when the header is absent; `InvalidToken` when it is present but
/// not a bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AppError::InvalidToken)?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(AppError::InvalidToken),
    }
}

/// Resolves the request's token to an identity and enforces `capability`.
pub fn authorize(
    headers: &HeaderMap,
    capability: Capability,
    sessions: &SessionAuthenticator,
) -> Result<Identity, AppError> {
    let token = bearer_token(headers)?.ok_or(AppError::Unauthenticated)?;
    let identity = sessions.validate(token)?;
    identity.require(capability)?;
    Ok(identity)
}
