//! Credential verification and session token issuance.

use std::sync::Arc;

use chrono::Duration;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        AuthResponse, LoginRequest, NewUser, PasswordUpdate, PublicUser, RegisterRequest,
        UpdateProfileRequest, User, UserChanges,
    },
    services::guard::Identity,
    store::Store,
    utils::{
        hash::{HashCost, hash_password, verify_password},
        jwt::{sign_jwt, verify_jwt},
    },
};

#[derive(Clone)]
pub struct SessionAuthenticator {
    store: Arc<dyn Store>,
    jwt_secret: String,
    register_ttl: Duration,
    login_ttl: Duration,
    hash_cost: HashCost,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl SessionAuthenticator {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            store,
            jwt_secret: config.jwt_secret.clone(),
            register_ttl: Duration::days(config.register_token_ttl_days),
            login_ttl: Duration::days(config.login_token_ttl_days),
            hash_cost: HashCost {
                iterations: config.password_hash_iterations,
                memory_kib: config.password_hash_memory_kib,
            },
        }
    }

    /// Creates a non-admin user and issues a registration token.
    pub async fn register(&self, payload: RegisterRequest) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let username = payload.username.trim().to_string();
        let email = normalize_email(&payload.email);

        self.ensure_available(Some(&username), Some(&email), None).await?;

        let password_hash = self.hash(payload.password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                username,
                email,
                password_hash,
                is_admin: false,
            })
            .await?;

        tracing::info!(user_id = user.id, "Registered user {}", user.username);

        let token = sign_jwt(user.id, user.is_admin, &self.jwt_secret, self.register_ttl)?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Verifies email and password and issues a login token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, payload: LoginRequest) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let user = self
            .store
            .find_user_by_email(&normalize_email(&payload.email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.verify(payload.password, user.password.clone()).await? {
            return Err(AppError::InvalidCredentials);
        }

        let token = sign_jwt(user.id, user.is_admin, &self.jwt_secret, self.login_ttl)?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Checks signature and expiry. No database access.
    pub fn validate(&self, token: &str) -> Result<Identity, AppError> {
        let claims = verify_jwt(token, &self.jwt_secret)?;
        Ok(Identity {
            user_id: claims.user_id()?,
            is_admin: claims.is_admin,
        })
    }

    /// Creates the configured admin account if no user with that email exists yet.
    /// Returns whether an account was created.
    pub async fn provision_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        let email = normalize_email(email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        tracing::info!("Seeding admin user: {}", username);
        let password_hash = self.hash(password.to_string()).await?;
        self.store
            .insert_user(NewUser {
                username: username.trim().to_string(),
                email,
                password_hash,
                is_admin: true,
            })
            .await?;
        tracing::info!("Admin user created successfully.");

        Ok(true)
    }

    pub async fn current_user(&self, identity: &Identity) -> Result<PublicUser, AppError> {
        Ok(self.load(identity.user_id).await?.into())
    }

    /// Updates the caller's own profile. The password is re-hashed only when supplied.
    pub async fn update_profile(
        &self,
        identity: &Identity,
        payload: UpdateProfileRequest,
    ) -> Result<PublicUser, AppError> {
        payload.validate()?;
        let current = self.load(identity.user_id).await?;

        let username = payload
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| *u != current.username);
        let email = payload
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| *e != current.email);

        self.ensure_available(username.as_deref(), email.as_deref(), Some(current.id))
            .await?;

        let password = match payload.password {
            Some(plain) => PasswordUpdate::Replace(self.hash(plain).await?),
            None => PasswordUpdate::Unchanged,
        };

        let user = self
            .store
            .update_user(
                current.id,
                UserChanges {
                    username,
                    email,
                    password,
                },
            )
            .await?;

        Ok(user.into())
    }

    async fn load(&self, id: i64) -> Result<User, AppError> {
        self.store
            .find_user(id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    /// Friendly per-field conflict messages; the store's unique constraints stay authoritative.
    async fn ensure_available(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<i64>,
    ) -> Result<(), AppError> {
        if let Some(username) = username {
            if let Some(existing) = self.store.find_user_by_username(username).await? {
                if Some(existing.id) != except {
                    return Err(AppError::Conflict(format!(
                        "Username '{}' already exists",
                        username
                    )));
                }
            }
        }

        if let Some(email) = email {
            if let Some(existing) = self.store.find_user_by_email(email).await? {
                if Some(existing.id) != except {
                    return Err(AppError::Conflict(format!("Email '{}' already exists", email)));
                }
            }
        }

        Ok(())
    }

    async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AppError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
    }
}
