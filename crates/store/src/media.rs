//! Artifact byte storage.
//!
//! A [`MediaStore`] turns a finished job's bytes into the URL recorded on
//! the asset, and reads them back for analysis.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use lumina_core::media::MediaHandle;
use lumina_core::types::AssetId;
use tokio::sync::RwLock;

use crate::error::StoreError;

const FILE_SCHEME: &str = "file://";
const MEMORY_SCHEME: &str = "memory://";

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist `media` for `asset_id` and return its URL.
    async fn save(&self, asset_id: AssetId, media: &MediaHandle) -> Result<String, StoreError>;

    /// Read back bytes previously returned by [`save`](Self::save).
    async fn read(&self, url: &str) -> Result<Vec<u8>, StoreError>;

    /// Delete media previously returned by [`save`](Self::save). Removing
    /// something that is already gone is not an error.
    async fn remove(&self, url: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

/// Writes artifacts to `<root>/<asset_id>.<ext>` and hands out absolute
/// `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, asset_id: AssetId, media: &MediaHandle) -> Result<String, StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(format!("{asset_id}.{}", media.extension()));
        tokio::fs::write(&path, &media.bytes).await?;

        let absolute = tokio::fs::canonicalize(&path).await?;
        tracing::debug!(
            %asset_id,
            path = %absolute.display(),
            bytes = media.len(),
            "Media saved",
        );
        Ok(format!("{FILE_SCHEME}{}", absolute.display()))
    }

    async fn read(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        Ok(tokio::fs::read(local_path(url)?).await?)
    }

    async fn remove(&self, url: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(local_path(url)?).await {
            Ok(()) => {
                tracing::debug!(url, "Media removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn local_path(url: &str) -> Result<&str, StoreError> {
    url.strip_prefix(FILE_SCHEME)
        .ok_or_else(|| StoreError::UnsupportedUrl(url.to_string()))
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps artifacts in a map under `memory://<asset_id>` URLs.
#[derive(Debug, Default)]
pub struct InMemoryMediaStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn save(&self, asset_id: AssetId, media: &MediaHandle) -> Result<String, StoreError> {
        let url = format!("{MEMORY_SCHEME}{asset_id}");
        self.blobs
            .write()
            .await
            .insert(url.clone(), media.bytes.clone());
        Ok(url)
    }

    async fn read(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| StoreError::UnsupportedUrl(url.to_string()))
    }

    async fn remove(&self, url: &str) -> Result<(), StoreError> {
        self.blobs.write().await.remove(url);
        Ok(())
    }
}
