//! Single-call image generation.
//!
//! Images come back in the response to one request, so there is no job
//! handle and no poll loop: init tick, checkpoint, call, checkpoint.

use std::sync::Arc;

use lumina_core::generation::GenerationRequest;
use lumina_core::media::MediaHandle;
use lumina_core::progress::{MonotonicReporter, ProgressReporter, ProgressTick};
use lumina_core::prompt::compose_prompt;
use lumina_provider::GenerationProvider;
use tokio_util::sync::CancellationToken;

use crate::error::{classify_provider_error, GenerationError};

pub struct ImageGenerator {
    provider: Arc<dyn GenerationProvider>,
}

impl ImageGenerator {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate<R>(
        &self,
        request: &GenerationRequest,
        reporter: &mut R,
        cancel: &CancellationToken,
    ) -> Result<MediaHandle, GenerationError>
    where
        R: ProgressReporter + ?Sized,
    {
        let settings = request.image_settings().ok_or_else(|| {
            GenerationError::InvalidRequest("the image generator only handles image requests".into())
        })?;

        let mut progress = MonotonicReporter::new(reporter);
        progress.emit(ProgressTick::init());

        if cancel.is_cancelled() {
            tracing::info!("Image generation cancelled before submission");
            return Err(GenerationError::Cancelled);
        }

        let prompt = compose_prompt(request);
        let (bytes, mime_type) = self
            .provider
            .submit_image_job(&prompt, settings.image_size, settings.aspect_ratio)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Image generation failed");
                classify_provider_error(&e)
            })?;

        if cancel.is_cancelled() {
            tracing::info!("Image generation cancelled after provider call");
            return Err(GenerationError::Cancelled);
        }

        if bytes.is_empty() {
            return Err(GenerationError::GenerationFailed(
                "No image data returned from model.".into(),
            ));
        }

        tracing::info!(
            image_size = %settings.image_size,
            aspect_ratio = %settings.aspect_ratio,
            bytes = bytes.len(),
            "Image generated",
        );
        Ok(MediaHandle::image(bytes, mime_type))
    }
}
