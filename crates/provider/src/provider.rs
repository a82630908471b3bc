//! The provider contract the job driver depends on.

use async_trait::async_trait;
use lumina_core::generation::{AspectRatio, ImageSize, Resolution, SeedImage};

use crate::error::ProviderError;

/// Provider-assigned state of one long-running job.
///
/// Returned by [`GenerationProvider::submit_video_job`] and replaced by
/// each [`GenerationProvider::poll_job`] call. Once `done`, the handle may
/// carry a result locator pointing at the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    name: String,
    done: bool,
    result_locator: Option<String>,
}

impl JobHandle {
    /// A job the provider is still working on.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            result_locator: None,
        }
    }

    /// A finished job. `result_locator` is `None` when the provider
    /// completed without producing an artifact.
    pub fn finished(name: impl Into<String>, result_locator: Option<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            result_locator,
        }
    }

    /// Provider operation name used for polling.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Artifact locator. Only meaningful once the job is done; empty
    /// locators are treated as absent.
    pub fn result_locator(&self) -> Option<&str> {
        self.result_locator.as_deref().filter(|l| !l.trim().is_empty())
    }
}

/// A remote generative-model service.
///
/// Video generation is asynchronous: submit, poll until done, fetch. Image
/// generation and analysis are single request/response calls.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Start a video job. The seed image, when given, becomes the first frame.
    async fn submit_video_job(
        &self,
        prompt: &str,
        seed_image: Option<&SeedImage>,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    ) -> Result<JobHandle, ProviderError>;

    /// Refresh a job's state.
    async fn poll_job(&self, handle: &JobHandle) -> Result<JobHandle, ProviderError>;

    /// Download the artifact a finished job points at.
    async fn fetch_artifact(&self, locator: &str) -> Result<Vec<u8>, ProviderError>;

    /// Generate one image. Returns the image bytes and their mime type.
    async fn submit_image_job(
        &self,
        prompt: &str,
        image_size: ImageSize,
        aspect_ratio: AspectRatio,
    ) -> Result<(Vec<u8>, String), ProviderError>;

    /// Describe a video. `None` when the model returned no text.
    async fn analyze_video(&self, video: &[u8], mime_type: &str)
        -> Result<Option<String>, ProviderError>;
}
