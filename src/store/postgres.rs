use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, types::Json};

use super::{MediaStore, PostStore, UserStore};
use crate::{
    error::AppError,
    models::{
        post::{BlogPost, NewPost, PostContent, PostQuery, RecipeMeta},
        user::{NewUser, PasswordUpdate, User, UserChanges},
    },
};

macro_rules! post_columns {
    () => {
        "id, slug, content, categories, tags, cover_image, images, status, publish_date, \
         recipe, views, author_id, created_at, updated_at"
    };
}

macro_rules! user_columns {
    () => {
        "id, username, email, password, is_admin, created_at"
    };
}

/// Postgres-backed store. Queries are checked at runtime so the crate builds
/// without a live database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw 'posts' row. JSONB columns decode through `sqlx::types::Json`.
#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    slug: String,
    content: Json<PostContent>,
    categories: Vec<String>,
    tags: Vec<String>,
    cover_image: Option<String>,
    images: Json<Vec<String>>,
    status: String,
    publish_date: Option<DateTime<Utc>>,
    recipe: Json<RecipeMeta>,
    views: i64,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for BlogPost {
    type Error = AppError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| {
            AppError::InternalServerError(format!("post {} has status '{}'", row.id, row.status))
        })?;

        Ok(BlogPost {
            id: row.id,
            slug: row.slug,
            content: row.content.0,
            categories: row.categories,
            tags: row.tags,
            cover_image: row.cover_image,
            images: row.images.0,
            status,
            publish_date: row.publish_date,
            recipe: row.recipe.0,
            views: row.views,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_posts(rows: Vec<PostRow>) -> Result<Vec<BlogPost>, AppError> {
    rows.into_iter().map(BlogPost::try_from).collect()
}

/// Rewords unique violations on the users table into a field-level message.
fn user_conflict(err: sqlx::Error, username: &str, email: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("users_username_key") => {
                return AppError::Conflict(format!("Username '{}' already exists", username));
            }
            Some("users_email_key") => {
                return AppError::Conflict(format!("Email '{}' already exists", email));
            }
            _ => {}
        }
    }
    AppError::from(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(concat!(
            "INSERT INTO users (username, email, password, is_admin) VALUES ($1, $2, $3, $4) RETURNING ",
            user_columns!()
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| user_conflict(e, &user.username, &user.email))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, AppError> {
        let username = changes.username.clone().unwrap_or_default();
        let email = changes.email.clone().unwrap_or_default();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = builder.separated(", ");

        // Keeps the statement valid when nothing else changes.
        separated.push("id = id");

        if let Some(new_username) = changes.username {
            separated.push("username = ");
            separated.push_bind_unseparated(new_username);
        }

        if let Some(new_email) = changes.email {
            separated.push("email = ");
            separated.push_bind_unseparated(new_email);
        }

        if let PasswordUpdate::Replace(hash) = changes.password {
            separated.push("password = ");
            separated.push_bind_unseparated(hash);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(concat!(" RETURNING ", user_columns!()));

        builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| user_conflict(e, &username, &email))?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: NewPost) -> Result<BlogPost, AppError> {
        let row = sqlx::query_as::<_, PostRow>(concat!(
            "INSERT INTO posts (slug, content, categories, tags, cover_image, images, status, \
             publish_date, recipe, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) RETURNING ",
            post_columns!()
        ))
        .bind(&post.slug)
        .bind(Json(&post.content))
        .bind(&post.categories)
        .bind(&post.tags)
        .bind(&post.cover_image)
        .bind(Json(&post.images))
        .bind(post.status.as_str())
        .bind(post.publish_date)
        .bind(Json(&post.recipe))
        .bind(post.author_id)
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("A post with slug '{}' already exists", post.slug))
            }
            other => other,
        })?;

        row.try_into()
    }

    async fn find_post(&self, id: i64) -> Result<Option<BlogPost>, AppError> {
        sqlx::query_as::<_, PostRow>(concat!(
            "SELECT ",
            post_columns!(),
            " FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(BlogPost::try_from)
        .transpose()
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError> {
        sqlx::query_as::<_, PostRow>(concat!(
            "SELECT ",
            post_columns!(),
            " FROM posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .map(BlogPost::try_from)
        .transpose()
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<BlogPost>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(concat!("SELECT ", post_columns!(), " FROM posts WHERE TRUE"));

        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }

        if let Some(category) = &query.category {
            builder
                .push(" AND ")
                .push_bind(category.clone())
                .push(" = ANY(categories)");
        }

        if let Some(tag) = &query.tag {
            builder
                .push(" AND ")
                .push_bind(tag.clone())
                .push(" = ANY(tags)");
        }

        if let Some(cursor) = query.cursor {
            builder.push(" AND created_at < ").push_bind(cursor);
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(query.effective_limit());

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list posts: {:?}", e);
                AppError::from(e)
            })?;

        into_posts(rows)
    }

    async fn save_post(&self, post: &BlogPost) -> Result<BlogPost, AppError> {
        sqlx::query_as::<_, PostRow>(concat!(
            "UPDATE posts SET content = $2, categories = $3, tags = $4, cover_image = $5, \
             images = $6, status = $7, publish_date = $8, recipe = $9, updated_at = $10 \
             WHERE id = $1 RETURNING ",
            post_columns!()
        ))
        .bind(post.id)
        .bind(Json(&post.content))
        .bind(&post.categories)
        .bind(&post.tags)
        .bind(&post.cover_image)
        .bind(Json(&post.images))
        .bind(post.status.as_str())
        .bind(post.publish_date)
        .bind(Json(&post.recipe))
        .bind(post.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?
        .try_into()
    }

    async fn delete_post(&self, id: i64) -> Result<Option<BlogPost>, AppError> {
        sqlx::query_as::<_, PostRow>(concat!(
            "DELETE FROM posts WHERE id = $1 RETURNING ",
            post_columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(BlogPost::try_from)
        .transpose()
    }

    async fn increment_views(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn media_in_use(&self, url: &str) -> Result<bool, AppError> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE cover_image = $1 OR images ? $1)",
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await?;

        Ok(in_use)
    }
}

#[async_trait]
impl MediaStore for PgStore {
    async fn insert_media(&self, url: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO media (url) VALUES ($1) ON CONFLICT (url) DO NOTHING")
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn media_exists(&self, url: &str) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM media WHERE url = $1)")
                .bind(url)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn remove_media(&self, url: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM media WHERE url = $1")
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
