//! Gemini REST wire types.
//!
//! Video jobs go through `models/{model}:predictLongRunning`, which
//! returns a long-running operation `{"name": ..., "done": ...}` that is
//! polled at `GET /v1beta/{name}`. Images and analysis use
//! `models/{model}:generateContent`. Field names follow the API's
//! camelCase JSON.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::provider::JobHandle;

// ---------------------------------------------------------------------------
// predictLongRunning
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PredictLongRunningRequest {
    pub instances: Vec<VideoInstance>,
    pub parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
pub struct VideoInstance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EncodedImage>,
}

/// An inline image in the `bytesBase64Encoded` form used by predict
/// endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            bytes_base64_encoded: BASE64.encode(bytes),
            mime_type: mime_type.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub aspect_ratio: String,
    pub resolution: String,
    pub sample_count: u32,
}

/// A long-running operation as returned by submit and poll.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<OperationResponse>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoRef {
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl Operation {
    /// URI of the first generated video, if any.
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
    }

    /// Convert into a [`JobHandle`], surfacing an operation-level error.
    pub fn into_handle(mut self) -> Result<JobHandle, ProviderError> {
        if let Some(err) = self.error.take() {
            return Err(ProviderError::Operation {
                code: err.code,
                message: err.message,
            });
        }
        if !self.done {
            return Ok(JobHandle::pending(self.name));
        }
        let uri = self.video_uri().map(str::to_string);
        Ok(JobHandle::finished(self.name, uri))
    }
}

// ---------------------------------------------------------------------------
// generateContent
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: BASE64.encode(bytes),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
    pub image_size: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates.iter().flat_map(|c| c.content.parts.iter())
    }

    /// Decode the first inline image. Returns `(bytes, mime_type)`.
    pub fn first_image(&self) -> Result<Option<(Vec<u8>, String)>, ProviderError> {
        let Some(inline) = self.parts().find_map(|p| p.inline_data.as_ref()) else {
            return Ok(None);
        };
        let bytes = BASE64
            .decode(inline.data.as_bytes())
            .map_err(|e| ProviderError::MalformedResponse(format!("Invalid base64 image: {e}")))?;
        let mime = if inline.mime_type.is_empty() {
            lumina_core::media::MIME_IMAGE_PNG.to_string()
        } else {
            inline.mime_type.clone()
        };
        Ok(Some((bytes, mime)))
    }

    /// Concatenated text of every text part, or `None` when there is none.
    pub fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Standard Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Extract the `message` from an error envelope, falling back to the raw
/// body when it is not one.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Operations --

    #[test]
    fn parse_pending_operation() {
        let json = r#"{"name":"models/veo/operations/abc"}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        let handle = op.into_handle().unwrap();
        assert!(!handle.is_done());
        assert_eq!(handle.name(), "models/veo/operations/abc");
    }

    #[test]
    fn parse_finished_operation_with_video() {
        let json = r#"{
            "name": "models/veo/operations/abc",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": "https://files/abc:download?alt=media"}}]
                }
            }
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(op.video_uri(), Some("https://files/abc:download?alt=media"));
        let handle = op.into_handle().unwrap();
        assert!(handle.is_done());
        assert_eq!(
            handle.result_locator(),
            Some("https://files/abc:download?alt=media")
        );
    }

    #[test]
    fn finished_operation_without_samples_has_no_locator() {
        let json = r#"{"name":"op","done":true,"response":{"generateVideoResponse":{}}}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        let handle = op.into_handle().unwrap();
        assert!(handle.is_done());
        assert!(handle.result_locator().is_none());
    }

    #[test]
    fn operation_error_becomes_provider_error() {
        let json = r#"{"name":"op","done":true,"error":{"code":3,"message":"Prompt blocked by safety filters"}}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        match op.into_handle() {
            Err(ProviderError::Operation { code, message }) => {
                assert_eq!(code, 3);
                assert_eq!(message, "Prompt blocked by safety filters");
            }
            other => panic!("Expected Operation error, got {other:?}"),
        }
    }

    // -- Requests --

    #[test]
    fn predict_request_shape() {
        let req = PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt: "a red cube".into(),
                image: Some(EncodedImage::from_bytes(b"png", "image/png")),
            }],
            parameters: VideoParameters {
                aspect_ratio: "16:9".into(),
                resolution: "720p".into(),
                sample_count: 1,
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["instances"][0]["prompt"], "a red cube");
        assert_eq!(json["instances"][0]["image"]["bytesBase64Encoded"], "cG5n");
        assert_eq!(json["instances"][0]["image"]["mimeType"], "image/png");
        assert_eq!(json["parameters"]["aspectRatio"], "16:9");
        assert_eq!(json["parameters"]["sampleCount"], 1);
    }

    #[test]
    fn predict_request_omits_missing_image() {
        let instance = VideoInstance {
            prompt: "p".into(),
            image: None,
        };
        let json = serde_json::to_value(&instance).unwrap();
        assert!(json.get("image").is_none());
    }

    #[test]
    fn image_request_shape() {
        let req = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text("a lighthouse")],
            }],
            generation_config: Some(GenerationConfig {
                image_config: ImageConfig {
                    aspect_ratio: "9:16".into(),
                    image_size: "1K".into(),
                },
            }),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "a lighthouse");
        assert!(json["contents"][0]["parts"][0].get("inlineData").is_none());
        assert_eq!(json["generationConfig"]["imageConfig"]["imageSize"], "1K");
    }

    // -- Responses --

    #[test]
    fn first_image_decodes_inline_data() {
        let json = r#"{"candidates":[{"content":{"parts":[
            {"text":"Here you go"},
            {"inlineData":{"mimeType":"image/png","data":"aGVsbG8="}}
        ]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let (bytes, mime) = resp.first_image().unwrap().unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn first_image_none_when_only_text() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"no image"}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(resp.first_image().unwrap().is_none());
    }

    #[test]
    fn first_image_rejects_bad_base64() {
        let json = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"@@@"}}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.first_image(),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn text_joins_parts() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"Moody "},{"text":"and slow."}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text().as_deref(), Some("Moody and slow."));
    }

    #[test]
    fn text_none_for_empty_candidates() {
        let resp: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.text().is_none());
    }

    // -- Errors --

    #[test]
    fn error_message_from_envelope() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "Requested entity was not found.");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }
}
