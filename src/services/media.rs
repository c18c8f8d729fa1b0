//! Bookkeeping of image URLs handed out by object storage.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;
use uuid::Uuid;

use crate::{error::AppError, models::media::MediaReference, store::Store};

/// External object storage: `upload(bytes) -> url`, `delete(url)`.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores the bytes and returns the public URL. Fails with `AppError::Upload`.
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, AppError>;
    /// Best-effort removal.
    async fn delete(&self, url: &str) -> Result<(), AppError>;
}

/// Writes uploads into a local directory served under `/uploads`.
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            root,
            public_base_url: public_base_url.into(),
        }
    }

    /// Maps one of our own URLs back to a file under `root`.
    fn path_for(&self, url: &str) -> Result<PathBuf, AppError> {
        let prefix = format!("{}/uploads/", self.public_base_url);
        let name = url
            .strip_prefix(&prefix)
            .filter(|n| !n.is_empty() && !n.contains('/') && !n.contains(".."))
            .ok_or_else(|| AppError::Upload(format!("'{}' is not a local upload", url)))?;
        Ok(self.root.join(name))
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        let name = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
        tokio::fs::write(self.root.join(&name), bytes)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        Ok(format!("{}/uploads/{}", self.public_base_url, name))
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let path = self.path_for(url)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| AppError::Upload(format!("{}: {}", path.display(), e)))
    }
}

/// Tracks which image URLs were acknowledged by object storage.
#[derive(Clone)]
pub struct MediaManager {
    store: Arc<dyn Store>,
    storage: Arc<dyn ObjectStorage>,
}

/// Absolute http(s) URL, in canonical form.
fn canonical_url(raw: &str) -> Result<String, AppError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| AppError::Validation(format!("'{}' is not a valid URL: {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        other => Err(AppError::Validation(format!(
            "'{}' uses unsupported scheme '{}'",
            raw, other
        ))),
    }
}

impl MediaManager {
    pub fn new(store: Arc<dyn Store>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    /// Records a URL returned by object storage. No network I/O.
    pub async fn register_upload(&self, url: &str) -> Result<MediaReference, AppError> {
        let url = canonical_url(url)?;
        self.store.insert_media(&url).await?;
        Ok(MediaReference { url })
    }

    /// Checks that `url` was previously registered.
    pub async fn ensure_registered(&self, url: &str) -> Result<MediaReference, AppError> {
        let url = canonical_url(url)?;
        if !self.store.media_exists(&url).await? {
            return Err(AppError::Validation(format!(
                "Image '{}' was not uploaded through the media library",
                url
            )));
        }
        Ok(MediaReference { url })
    }

    /// Uploads an image through the collaborator and registers the result.
    pub async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<MediaReference, AppError> {
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(format!(
                "Only images can be uploaded, got '{}'",
                content_type
            )));
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let url = self.storage.upload(bytes, content_type).await?;
        let reference = self.register_upload(&url).await?;
        tracing::info!(url = %reference.url, "Stored upload");

        Ok(reference)
    }

    /// Deletes from object storage and forgets the reference. Never fails;
    /// problems are logged.
    pub async fn release(&self, reference: &MediaReference) {
        if let Err(e) = self.storage.delete(reference.as_str()).await {
            tracing::warn!(url = %reference.url, "Failed to delete from object storage: {}", e);
        }
        if let Err(e) = self.store.remove_media(reference.as_str()).await {
            tracing::warn!(url = %reference.url, "Failed to forget media reference: {}", e);
        }
    }

    pub async fn release_all(&self, references: Vec<MediaReference>) {
        for reference in &references {
            self.release(reference).await;
        }
    }
}
