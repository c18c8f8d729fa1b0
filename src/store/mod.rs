//! Persistence ports for users, posts and media references.
//!
//! `PgStore` is the production backend; `MemoryStore` backs local development
//! without a database and the test suite.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        post::{BlogPost, NewPost, PostQuery},
        user::{NewUser, User, UserChanges},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// The password column is written only for `PasswordUpdate::Replace`.
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, AppError>;
}

/// Blog post collection.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fails with `Conflict` when the slug is taken.
    async fn insert_post(&self, post: NewPost) -> Result<BlogPost, AppError>;
    async fn find_post(&self, id: i64) -> Result<Option<BlogPost>, AppError>;
    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError>;
    /// Newest first, filtered by every `Some` field of `query`.
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<BlogPost>, AppError>;
    /// Writes the document fields of `post` (last writer wins).
    /// `slug`, `views`, `author_id` and `created_at` are never written.
    async fn save_post(&self, post: &BlogPost) -> Result<BlogPost, AppError>;
    /// Returns the removed post, or `None` if it did not exist.
    async fn delete_post(&self, id: i64) -> Result<Option<BlogPost>, AppError>;
    /// Atomic `views += 1`. Returns `false` for an unknown id.
    async fn increment_views(&self, id: i64) -> Result<bool, AppError>;
    /// Whether any stored post uses `url` as its cover or in its gallery.
    async fn media_in_use(&self, url: &str) -> Result<bool, AppError>;
}

/// Acknowledged uploads.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Idempotent.
    async fn insert_media(&self, url: &str) -> Result<(), AppError>;
    async fn media_exists(&self, url: &str) -> Result<bool, AppError>;
    async fn remove_media(&self, url: &str) -> Result<(), AppError>;
}

pub trait Store: UserStore + PostStore + MediaStore {}

impl<T> Store for T where T: UserStore + PostStore + MediaStore {}
