//! Per-user asset history.
//!
//! Each user owns an ordered list of [`Asset`] records, most recent first.
//! Records are never edited except to attach analysis text to a video,
//! and are only removed by clearing the whole list.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lumina_core::assets::Asset;
use lumina_core::types::{is_valid_user_id, AssetId};
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;

/// Storage for the asset lists of all users.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// All assets of `user_id`, most recent first. Unknown users have an
    /// empty list.
    async fn load(&self, user_id: &str) -> Result<Vec<Asset>, StoreError>;

    /// Add `asset` at the front of the user's list.
    async fn append(&self, user_id: &str, asset: Asset) -> Result<(), StoreError>;

    /// Remove every asset of `user_id`. Other users are unaffected.
    async fn clear(&self, user_id: &str) -> Result<(), StoreError>;

    /// Attach analysis text to one of the user's videos and return the
    /// updated record.
    async fn attach_analysis(
        &self,
        user_id: &str,
        asset_id: AssetId,
        analysis: &str,
    ) -> Result<Asset, StoreError>;
}

/// Shared edit step for [`AssetStore::attach_analysis`].
fn attach_to(assets: &mut [Asset], asset_id: AssetId, analysis: &str) -> Result<Asset, StoreError> {
    let asset = assets
        .iter_mut()
        .find(|a| a.id() == asset_id)
        .ok_or(StoreError::AssetNotFound(asset_id))?;

    match asset {
        Asset::Video(video) => {
            video.analysis = Some(analysis.to_string());
            Ok(Asset::Video(video.clone()))
        }
        Asset::Image(_) => Err(StoreError::NotAVideo(asset_id)),
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    assets: RwLock<HashMap<String, Vec<Asset>>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn load(&self, user_id: &str) -> Result<Vec<Asset>, StoreError> {
        let assets = self.assets.read().await;
        Ok(assets.get(user_id).cloned().unwrap_or_default())
    }

    async fn append(&self, user_id: &str, asset: Asset) -> Result<(), StoreError> {
        let mut assets = self.assets.write().await;
        assets.entry(user_id.to_string()).or_default().insert(0, asset);
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        self.assets.write().await.remove(user_id);
        Ok(())
    }

    async fn attach_analysis(
        &self,
        user_id: &str,
        asset_id: AssetId,
        analysis: &str,
    ) -> Result<Asset, StoreError> {
        let mut assets = self.assets.write().await;
        let list = assets
            .get_mut(user_id)
            .ok_or(StoreError::AssetNotFound(asset_id))?;
        attach_to(list, asset_id, analysis)
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// One JSON array per user at `<root>/<user_id>.json`.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a crash mid-write leaves the previous list intact. A single
/// mutex serializes read-modify-write cycles.
#[derive(Debug)]
pub struct JsonFileAssetStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_user_id(user_id) {
            return Err(StoreError::InvalidUserId(user_id.to_string()));
        }
        Ok(self.root.join(format!("{user_id}.json")))
    }

    async fn read_list(path: &Path) -> Result<Vec<Asset>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_list(&self, path: &Path, assets: &[Asset]) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let raw = serde_json::to_vec_pretty(assets)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &raw).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl AssetStore for JsonFileAssetStore {
    async fn load(&self, user_id: &str) -> Result<Vec<Asset>, StoreError> {
        let path = self.user_path(user_id)?;
        Self::read_list(&path).await
    }

    async fn append(&self, user_id: &str, asset: Asset) -> Result<(), StoreError> {
        let path = self.user_path(user_id)?;
        let _guard = self.write_lock.lock().await;

        let mut assets = Self::read_list(&path).await?;
        let asset_id = asset.id();
        assets.insert(0, asset);
        self.write_list(&path, &assets).await?;

        tracing::debug!(user_id, %asset_id, count = assets.len(), "Asset appended");
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        let path = self.user_path(user_id)?;
        let _guard = self.write_lock.lock().await;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user_id, "Asset history cleared");
        Ok(())
    }

    async fn attach_analysis(
        &self,
        user_id: &str,
        asset_id: AssetId,
        analysis: &str,
    ) -> Result<Asset, StoreError> {
        let path = self.user_path(user_id)?;
        let _guard = self.write_lock.lock().await;

        let mut assets = Self::read_list(&path).await?;
        let updated = attach_to(&mut assets, asset_id, analysis)?;
        self.write_list(&path, &assets).await?;
        Ok(updated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use lumina_core::assets::{GeneratedImage, GeneratedVideo, ImageAssetConfig, VideoAssetConfig};
    use lumina_core::generation::{ImageSettings, StyleType, VideoSettings};

    use super::*;

    fn video(user: &str, prompt: &str) -> Asset {
        Asset::Video(GeneratedVideo {
            id: uuid::Uuid::new_v4(),
            user_id: user.to_string(),
            url: "file:///tmp/v.mp4".to_string(),
            prompt: prompt.to_string(),
            timestamp: Utc::now(),
            config: VideoAssetConfig::from_settings(&VideoSettings::default(), StyleType::None),
            analysis: None,
        })
    }

    fn image(user: &str) -> Asset {
        Asset::Image(GeneratedImage {
            id: uuid::Uuid::new_v4(),
            user_id: user.to_string(),
            url: "file:///tmp/i.png".to_string(),
            prompt: "still".to_string(),
            timestamp: Utc::now(),
            config: ImageAssetConfig::from_settings(&ImageSettings::default(), StyleType::Neon),
        })
    }

    // -- in-memory --

    #[tokio::test]
    async fn memory_append_prepends() {
        let store = InMemoryAssetStore::new();
        store.append("u", video("u", "first")).await.unwrap();
        store.append("u", video("u", "second")).await.unwrap();

        let assets = store.load("u").await.unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].prompt(), "second");
        assert_eq!(assets[1].prompt(), "first");
    }

    #[tokio::test]
    async fn memory_clear_is_per_user() {
        let store = InMemoryAssetStore::new();
        store.append("a", video("a", "x")).await.unwrap();
        store.append("b", video("b", "y")).await.unwrap();

        store.clear("a").await.unwrap();
        assert!(store.load("a").await.unwrap().is_empty());
        assert_eq!(store.load("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn memory_attach_analysis_to_video() {
        let store = InMemoryAssetStore::new();
        let asset = video("u", "x");
        let id = asset.id();
        store.append("u", asset).await.unwrap();

        let updated = store.attach_analysis("u", id, "Wide shot.").await.unwrap();
        assert_eq!(updated.analysis(), Some("Wide shot."));
        assert_eq!(store.load("u").await.unwrap()[0].analysis(), Some("Wide shot."));
    }

    #[tokio::test]
    async fn memory_attach_analysis_rejects_image() {
        let store = InMemoryAssetStore::new();
        let asset = image("u");
        let id = asset.id();
        store.append("u", asset).await.unwrap();

        let err = store.attach_analysis("u", id, "nope").await.unwrap_err();
        assert_matches!(err, StoreError::NotAVideo(found) if found == id);
    }

    #[tokio::test]
    async fn memory_attach_analysis_unknown_asset() {
        let store = InMemoryAssetStore::new();
        store.append("u", video("u", "x")).await.unwrap();

        let missing = uuid::Uuid::new_v4();
        let err = store.attach_analysis("u", missing, "t").await.unwrap_err();
        assert_matches!(err, StoreError::AssetNotFound(_));
    }

    // -- json file --

    #[tokio::test]
    async fn json_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAssetStore::new(dir.path());
        assert!(store.load("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAssetStore::new(dir.path().join("assets"));
        store.append("u", video("u", "first")).await.unwrap();
        store.append("u", image("u")).await.unwrap();

        let reopened = JsonFileAssetStore::new(dir.path().join("assets"));
        let assets = reopened.load("u").await.unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].kind(), lumina_core::generation::AssetKind::Image);
        assert_eq!(assets[1].prompt(), "first");

        let raw = std::fs::read_to_string(dir.path().join("assets/u.json")).unwrap();
        assert!(raw.contains("\"type\": \"video\""));
        assert!(raw.contains("\"userId\": \"u\""));
    }

    #[tokio::test]
    async fn json_clear_leaves_other_users() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAssetStore::new(dir.path());
        store.append("a", video("a", "x")).await.unwrap();
        store.append("b", video("b", "y")).await.unwrap();

        store.clear("a").await.unwrap();
        store.clear("a").await.unwrap();
        assert!(store.load("a").await.unwrap().is_empty());
        assert_eq!(store.load("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn json_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAssetStore::new(dir.path());
        let err = store.load("../escape").await.unwrap_err();
        assert_matches!(err, StoreError::InvalidUserId(_));
    }

    #[tokio::test]
    async fn json_attach_analysis_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAssetStore::new(dir.path());
        let asset = video("u", "x");
        let id = asset.id();
        store.append("u", asset).await.unwrap();

        store.attach_analysis("u", id, "Slow dolly.").await.unwrap();
        let assets = store.load("u").await.unwrap();
        assert_eq!(assets[0].analysis(), Some("Slow dolly."));
    }

    #[tokio::test]
    async fn json_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("u.json"), b"not json").unwrap();
        let store = JsonFileAssetStore::new(dir.path());
        let err = store.load("u").await.unwrap_err();
        assert_matches!(err, StoreError::Serialization(_));
    }
}
