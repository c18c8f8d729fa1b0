use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{MediaStore, PostStore, UserStore};
use crate::{
    error::AppError,
    models::{
        post::{BlogPost, NewPost, PostQuery},
        user::{NewUser, PasswordUpdate, User, UserChanges},
    },
};

/// In-process store. Every operation runs under one short mutex section, which
/// makes each call atomic the way a single SQL statement is.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    last_user_id: i64,
    users: BTreeMap<i64, User>,
    last_post_id: i64,
    posts: BTreeMap<i64, BlogPost>,
    media: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store poisoned".to_string()))
    }
}

impl Inner {
    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.lock()?;

        if inner.username_taken(&user.username, None) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }
        if inner.email_taken(&user.email, None) {
            return Err(AppError::Conflict(format!(
                "Email '{}' already exists",
                user.email
            )));
        }

        inner.last_user_id += 1;
        let record = User {
            id: inner.last_user_id,
            username: user.username,
            email: user.email,
            password: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        inner.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, AppError> {
        let mut inner = self.lock()?;

        if let Some(username) = &changes.username {
            if inner.username_taken(username, Some(id)) {
                return Err(AppError::Conflict(format!(
                    "Username '{}' already exists",
                    username
                )));
            }
        }
        if let Some(email) = &changes.email {
            if inner.email_taken(email, Some(id)) {
                return Err(AppError::Conflict(format!("Email '{}' already exists", email)));
            }
        }

        let user = inner
            .users
            .get_mut(&id)
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let PasswordUpdate::Replace(hash) = changes.password {
            user.password = hash;
        }

        Ok(user.clone())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<BlogPost, AppError> {
        let mut inner = self.lock()?;

        if inner.posts.values().any(|p| p.slug == post.slug) {
            return Err(AppError::Conflict(format!(
                "A post with slug '{}' already exists",
                post.slug
            )));
        }

        inner.last_post_id += 1;
        let record = BlogPost {
            id: inner.last_post_id,
            slug: post.slug,
            content: post.content,
            categories: post.categories,
            tags: post.tags,
            cover_image: post.cover_image,
            images: post.images,
            status: post.status,
            publish_date: post.publish_date,
            recipe: post.recipe,
            views: 0,
            author_id: post.author_id,
            created_at: post.created_at,
            updated_at: post.created_at,
        };
        inner.posts.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_post(&self, id: i64) -> Result<Option<BlogPost>, AppError> {
        Ok(self.lock()?.posts.get(&id).cloned())
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError> {
        Ok(self
            .lock()?
            .posts
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<BlogPost>, AppError> {
        let inner = self.lock()?;

        let mut posts: Vec<BlogPost> = inner
            .posts
            .values()
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .filter(|p| {
                query
                    .category
                    .as_ref()
                    .is_none_or(|c| p.categories.contains(c))
            })
            .filter(|p| query.tag.as_ref().is_none_or(|t| p.tags.contains(t)))
            .filter(|p| query.cursor.is_none_or(|c| p.created_at < c))
            .cloned()
            .collect();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts.truncate(query.effective_limit() as usize);

        Ok(posts)
    }

    async fn save_post(&self, post: &BlogPost) -> Result<BlogPost, AppError> {
        let mut inner = self.lock()?;

        let stored = inner
            .posts
            .get_mut(&post.id)
            .ok_or(AppError::NotFound("Post not found".to_string()))?;

        stored.content = post.content.clone();
        stored.categories = post.categories.clone();
        stored.tags = post.tags.clone();
        stored.cover_image = post.cover_image.clone();
        stored.images = post.images.clone();
        stored.status = post.status;
        stored.publish_date = post.publish_date;
        stored.recipe = post.recipe.clone();
        stored.updated_at = post.updated_at;

        Ok(stored.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<Option<BlogPost>, AppError> {
        Ok(self.lock()?.posts.remove(&id))
    }

    async fn increment_views(&self, id: i64) -> Result<bool, AppError> {
        let mut inner = self.lock()?;
        match inner.posts.get_mut(&id) {
            Some(post) => {
                post.views += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn media_in_use(&self, url: &str) -> Result<bool, AppError> {
        Ok(self
            .lock()?
            .posts
            .values()
            .any(|p| p.cover_image.as_deref() == Some(url) || p.images.iter().any(|i| i == url)))
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn insert_media(&self, url: &str) -> Result<(), AppError> {
        self.lock()?.media.insert(url.to_string());
        Ok(())
    }

    async fn media_exists(&self, url: &str) -> Result<bool, AppError> {
        Ok(self.lock()?.media.contains(url))
    }

    async fn remove_media(&self, url: &str) -> Result<(), AppError> {
        self.lock()?.media.remove(url);
        Ok(())
    }
}
