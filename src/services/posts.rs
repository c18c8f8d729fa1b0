//! Blog post lifecycle: validation, draft/published transitions, deletion.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        media::MediaReference,
        post::{
            BlogPost, Locale, NewPost, PostContent, PostForm, PostPatch, PostQuery, PostStatus,
            RecipeMeta,
        },
    },
    services::{
        guard::{Capability, Identity},
        media::MediaManager,
        registry::{CategoryRegistry, normalize_tags},
    },
    store::Store,
    utils::slug::slugify,
};

#[derive(Clone)]
pub struct PostManager {
    store: Arc<dyn Store>,
    registry: Arc<CategoryRegistry>,
    media: MediaManager,
}

/// `published` is honored only when both locales are complete.
fn effective_status(requested: PostStatus, content: &PostContent) -> PostStatus {
    match requested {
        PostStatus::Published if content.is_complete() => PostStatus::Published,
        _ => PostStatus::Draft,
    }
}

fn locale_list(locales: &[Locale]) -> String {
    locales
        .iter()
        .map(Locale::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_recipe(recipe: RecipeMeta) -> Result<RecipeMeta, AppError> {
    recipe
        .validate()
        .map_err(|e| AppError::Validation(format!("recipe: {}", e)))?;
    Ok(recipe.normalized())
}

impl PostManager {
    pub fn new(store: Arc<dyn Store>, registry: Arc<CategoryRegistry>, media: MediaManager) -> Self {
        Self {
            store,
            registry,
            media,
        }
    }

    /// Creates a post. Admin only.
    pub async fn create(&self, identity: &Identity, form: PostForm) -> Result<BlogPost, AppError> {
        identity.require(Capability::Admin)?;

        form.content.check()?;
        let content = form.content.normalized();

        let title = content.english_title().ok_or(AppError::Validation(
            "content.en.title is required to derive the slug".to_string(),
        ))?;
        let slug = slugify(title).ok_or(AppError::Validation(
            "content.en.title must contain latin letters or digits".to_string(),
        ))?;

        let categories = self.check_categories(&form.categories)?;
        let tags = normalize_tags(&form.tags)?;
        let recipe = check_recipe(form.recipe)?;
        let cover_image = self.check_cover(form.cover_image).await?;
        let images = self.check_images(&form.images).await?;

        if self.store.find_post_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A post with slug '{}' already exists",
                slug
            )));
        }

        let status = effective_status(form.status.unwrap_or_default(), &content);
        if form.status == Some(PostStatus::Published) && status == PostStatus::Draft {
            tracing::info!(%slug, "Publish requested with incomplete content, saving as draft");
        }

        let now = Utc::now();
        let publish_date = match status {
            PostStatus::Published => Some(form.publish_date.unwrap_or(now)),
            PostStatus::Draft => form.publish_date,
        };

        let post = self
            .store
            .insert_post(NewPost {
                slug,
                content,
                categories,
                tags,
                cover_image,
                images,
                status,
                publish_date,
                recipe,
                author_id: identity.user_id,
                created_at: now,
            })
            .await?;

        tracing::info!(post_id = post.id, slug = %post.slug, status = post.status.as_str(), "Created post");
        Ok(post)
    }

    /// Applies a partial update. Admin only. The slug never changes.
    pub async fn update(
        &self,
        identity: &Identity,
        id: i64,
        patch: PostPatch,
    ) -> Result<BlogPost, AppError> {
        identity.require(Capability::Admin)?;

        if patch.is_empty() {
            tracing::debug!(post_id = id, "Empty update, only touching updatedAt");
        }

        let mut post = self.load(id).await?;
        let was_published = post.status == PostStatus::Published;

        if let Some(content) = patch.content {
            content.check()?;
            post.content.merge(content.normalized());
        }

        if let Some(categories) = patch.categories {
            post.categories = self.check_categories(&categories)?;
        }

        if let Some(tags) = patch.tags {
            post.tags = normalize_tags(&tags)?;
        }

        if let Some(cover_image) = patch.cover_image {
            post.cover_image = self.check_cover(cover_image).await?;
        }

        if let Some(images) = patch.images {
            post.images = self.check_images(&images).await?;
        }

        if let Some(recipe) = patch.recipe {
            post.recipe = check_recipe(recipe)?;
        }

        if let Some(publish_date) = patch.publish_date {
            post.publish_date = Some(publish_date);
        }

        match patch.status {
            Some(requested) => post.status = effective_status(requested, &post.content),
            None if was_published && !post.content.is_complete() => {
                return Err(AppError::PublishPrecondition(format!(
                    "Update would leave a published post with incomplete content for: {}",
                    locale_list(&post.content.incomplete_locales())
                )));
            }
            None => {}
        }

        let now = Utc::now();
        if post.status == PostStatus::Published && post.publish_date.is_none() {
            post.publish_date = Some(now);
        }
        post.updated_at = now;

        let saved = self.store.save_post(&post).await?;
        tracing::info!(post_id = saved.id, "Updated post");
        Ok(saved)
    }

    /// Moves a post between draft and published. Admin only.
    pub async fn set_status(
        &self,
        identity: &Identity,
        id: i64,
        target: PostStatus,
    ) -> Result<BlogPost, AppError> {
        identity.require(Capability::Admin)?;

        let mut post = self.load(id).await?;

        if target == PostStatus::Published {
            let missing = post.content.incomplete_locales();
            if !missing.is_empty() {
                return Err(AppError::PublishPrecondition(format!(
                    "Cannot publish: title and body are required for: {}",
                    locale_list(&missing)
                )));
            }
        }

        if post.status == target {
            return Ok(post);
        }

        let now = Utc::now();
        if target == PostStatus::Published && post.publish_date.is_none() {
            post.publish_date = Some(now);
        }
        post.status = target;
        post.updated_at = now;

        let saved = self.store.save_post(&post).await?;
        tracing::info!(post_id = saved.id, status = saved.status.as_str(), "Changed post status");
        Ok(saved)
    }

    /// Deletes a post, then releases its images in the background.
    ///
    /// The row delete is final on return; media cleanup runs on its own task
    /// and only logs failures. Images still used by another post are kept.
    pub async fn delete(&self, identity: &Identity, id: i64) -> Result<(), AppError> {
        identity.require(Capability::Admin)?;

        let post = self
            .store
            .delete_post(id)
            .await?
            .ok_or(AppError::NotFound("Post not found".to_string()))?;
        tracing::info!(post_id = post.id, slug = %post.slug, "Deleted post");

        let references: Vec<MediaReference> = post
            .media_references()
            .into_iter()
            .map(|url| MediaReference { url })
            .collect();

        if !references.is_empty() {
            let store = self.store.clone();
            let media = self.media.clone();
            tokio::spawn(async move {
                let mut unused = Vec::with_capacity(references.len());
                for reference in references {
                    match store.media_in_use(reference.as_str()).await {
                        Ok(false) => unused.push(reference),
                        Ok(true) => {
                            tracing::debug!(url = %reference.url, "Image still used by another post, keeping it");
                        }
                        Err(e) => {
                            tracing::warn!(url = %reference.url, "Could not check image usage, keeping it: {}", e);
                        }
                    }
                }
                media.release_all(unused).await;
            });
        }

        Ok(())
    }

    /// Increments the view counter. No authentication.
    pub async fn record_view(&self, id: i64) -> Result<(), AppError> {
        if self.store.increment_views(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Post not found".to_string()))
        }
    }

    /// A published post by slug. Drafts are invisible to the public.
    pub async fn get_published(&self, slug: &str) -> Result<BlogPost, AppError> {
        self.store
            .find_post_by_slug(slug)
            .await?
            .filter(|p| p.status == PostStatus::Published)
            .ok_or(AppError::NotFound("Post not found".to_string()))
    }

    pub async fn list_published(&self, mut query: PostQuery) -> Result<Vec<BlogPost>, AppError> {
        query.status = Some(PostStatus::Published);
        self.store.list_posts(&query).await
    }

    /// Any post by id, for the dashboard. Admin only.
    pub async fn get(&self, identity: &Identity, id: i64) -> Result<BlogPost, AppError> {
        identity.require(Capability::Admin)?;
        self.load(id).await
    }

    /// Posts in any status, for the dashboard. Admin only.
    pub async fn list_all(
        &self,
        identity: &Identity,
        query: PostQuery,
    ) -> Result<Vec<BlogPost>, AppError> {
        identity.require(Capability::Admin)?;
        self.store.list_posts(&query).await
    }

    async fn load(&self, id: i64) -> Result<BlogPost, AppError> {
        self.store
            .find_post(id)
            .await?
            .ok_or(AppError::NotFound("Post not found".to_string()))
    }

    /// Rejects unknown ids outright; returns the sorted, de-duplicated set.
    fn check_categories(&self, ids: &[String]) -> Result<Vec<String>, AppError> {
        let ids: Vec<String> = ids.iter().map(|id| id.trim().to_string()).collect();

        let invalid = self.registry.validate_category_ids(&ids, Locale::default());
        if !invalid.is_empty() {
            return Err(AppError::Validation(format!(
                "Unknown category ids: {}",
                invalid.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let mut ids = ids;
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn check_cover(&self, cover: Option<String>) -> Result<Option<String>, AppError> {
        match cover {
            Some(url) => Ok(Some(self.media.ensure_registered(&url).await?.url)),
            None => Ok(None),
        }
    }

    async fn check_images(&self, images: &[String]) -> Result<Vec<String>, AppError> {
        let mut checked = Vec::with_capacity(images.len());
        for url in images {
            checked.push(self.media.ensure_registered(url).await?.url);
        }
        Ok(checked)
    }
}
