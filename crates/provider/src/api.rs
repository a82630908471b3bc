//! REST client for the Gemini generative-language API.
//!
//! Wraps video job submission (`predictLongRunning`), operation polling,
//! artifact download, image generation and video analysis using
//! [`reqwest`].

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use lumina_core::generation::{AspectRatio, ImageSize, Resolution, SeedImage};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::messages::{
    error_message, Content, EncodedImage, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, ImageConfig, Operation, Part, PredictLongRunningRequest, VideoInstance,
    VideoParameters,
};
use crate::provider::{GenerationProvider, JobHandle};

/// Header carrying the API key on every request.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Instruction sent alongside a video for analysis.
pub const ANALYSIS_INSTRUCTION: &str =
    "Analyze this video for key information, cinematic style, and content summary.";

/// HTTP client for one Gemini API endpoint.
pub struct GeminiApi {
    client: reqwest::Client,
    config: ProviderConfig,
    /// Starts as `config.api_key`; replaced when the credential picker
    /// selects a new key.
    api_key: RwLock<Option<String>>,
}

impl GeminiApi {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling).
    pub fn with_client(client: reqwest::Client, config: ProviderConfig) -> Self {
        let api_key = RwLock::new(config.api_key.clone());
        Self {
            client,
            config,
            api_key,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the key sent on subsequent requests. Blank keys clear it.
    pub fn set_api_key(&self, key: Option<String>) {
        let key = key.filter(|k| !k.trim().is_empty());
        *self.api_key.write().unwrap_or_else(PoisonError::into_inner) = key;
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.config.base_url)
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/v1beta/{name}", self.config.base_url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.api_key.read().unwrap_or_else(PoisonError::into_inner);
        match key.as_deref() {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let response = self
            .authorized(self.client.post(self.model_url(model, "generateContent")))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ProviderError::ApiError`]
    /// carrying the status and the API's error message on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl GenerationProvider for GeminiApi {
    async fn submit_video_job(
        &self,
        prompt: &str,
        seed_image: Option<&SeedImage>,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    ) -> Result<JobHandle, ProviderError> {
        let body = PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt: prompt.to_string(),
                image: seed_image.map(|s| EncodedImage::from_bytes(&s.bytes, &s.mime_type)),
            }],
            parameters: VideoParameters {
                aspect_ratio: aspect_ratio.as_str().to_string(),
                resolution: resolution.as_str().to_string(),
                sample_count: 1,
            },
        };

        let response = self
            .authorized(
                self.client
                    .post(self.model_url(&self.config.video_model, "predictLongRunning")),
            )
            .json(&body)
            .send()
            .await?;

        let operation: Operation = Self::parse_response(response).await?;
        tracing::info!(
            operation = %operation.name,
            model = %self.config.video_model,
            "Video job submitted",
        );
        operation.into_handle()
    }

    async fn poll_job(&self, handle: &JobHandle) -> Result<JobHandle, ProviderError> {
        let response = self
            .authorized(self.client.get(self.operation_url(handle.name())))
            .send()
            .await?;

        let operation: Operation = Self::parse_response(response).await?;
        tracing::debug!(
            operation = %operation.name,
            done = operation.done,
            "Polled video job",
        );
        operation.into_handle()
    }

    async fn fetch_artifact(&self, locator: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.authorized(self.client.get(locator)).send().await?;
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        tracing::debug!(bytes = bytes.len(), "Artifact downloaded");
        Ok(bytes.to_vec())
    }

    async fn submit_image_job(
        &self,
        prompt: &str,
        image_size: ImageSize,
        aspect_ratio: AspectRatio,
    ) -> Result<(Vec<u8>, String), ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                image_config: ImageConfig {
                    aspect_ratio: aspect_ratio.as_str().to_string(),
                    image_size: image_size.as_str().to_string(),
                },
            }),
        };

        let response = self
            .generate_content(&self.config.image_model, &request)
            .await?;

        response.first_image()?.ok_or_else(|| {
            ProviderError::MalformedResponse("No image data returned from model.".to_string())
        })
    }

    async fn analyze_video(
        &self,
        video: &[u8],
        mime_type: &str,
    ) -> Result<Option<String>, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::inline(video, mime_type), Part::text(ANALYSIS_INSTRUCTION)],
            }],
            generation_config: None,
        };

        let response = self
            .generate_content(&self.config.analysis_model, &request)
            .await?;

        Ok(response.text())
    }
}
