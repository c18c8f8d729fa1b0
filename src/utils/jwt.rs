// src/utils/jwt.rs

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Admin flag captured when the token was issued.
    pub is_admin: bool,
    /// Issued-at as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)
    }
}

/// Signs a new JWT for the user, valid for `ttl` from now.
pub fn sign_jwt(id: i64, is_admin: bool, secret: &str, ttl: Duration) -> Result<String, AppError> {
    sign_jwt_at(id, is_admin, secret, Utc::now(), ttl)
}

/// Signs a JWT with an explicit issue time. `exp` is always `issued_at + ttl`.
pub fn sign_jwt_at(
    id: i64,
    is_admin: bool,
    secret: &str,
    issued_at: DateTime<Utc>,
    ttl: Duration,
) -> Result<String, AppError> {
    let expiration = issued_at
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::InternalServerError("token expiry overflow".to_string()))?;

    let claims = Claims {
        sub: id.to_string(),
        is_admin,
        iat: issued_at.timestamp().max(0) as usize,
        exp: expiration.timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Expiry is checked without leeway. Any failure maps to `AppError::InvalidToken`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims)
}
