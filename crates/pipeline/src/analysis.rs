//! Post-hoc video analysis.

use std::sync::Arc;

use lumina_core::assets::Asset;
use lumina_provider::GenerationProvider;
use lumina_store::{MediaStore, StoreError};

use crate::error::{classify_provider_error, SessionError};

/// Returned when the model produced no text.
pub const ANALYSIS_FALLBACK: &str = "No analysis available.";

/// Sends a stored video to the analysis model.
pub struct VideoAnalyzer {
    provider: Arc<dyn GenerationProvider>,
    media: Arc<dyn MediaStore>,
}

impl VideoAnalyzer {
    pub fn new(provider: Arc<dyn GenerationProvider>, media: Arc<dyn MediaStore>) -> Self {
        Self { provider, media }
    }

    /// Describe `asset`. Only videos can be analyzed.
    pub async fn analyze(&self, asset: &Asset) -> Result<String, SessionError> {
        let Asset::Video(video) = asset else {
            return Err(StoreError::NotAVideo(asset.id()).into());
        };

        let bytes = self.media.read(&video.url).await?;
        tracing::debug!(asset_id = %video.id, bytes = bytes.len(), "Analyzing video");

        let text = self
            .provider
            .analyze_video(&bytes, lumina_core::media::MIME_VIDEO_MP4)
            .await
            .map_err(|e| {
                tracing::warn!(asset_id = %video.id, error = %e, "Video analysis failed");
                classify_provider_error(&e)
            })?;

        Ok(text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| ANALYSIS_FALLBACK.to_string()))
    }
}
