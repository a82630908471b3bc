//! Persisted generation results.
//!
//! [`Asset`] is a sum type with a `"type"` discriminator so the JSON
//! layout is `{"type": "video", "id": ..., "userId": ..., "config": {...}}`.
//! Timestamps are stored as epoch milliseconds.

use serde::{Deserialize, Serialize};

use crate::generation::{
    AnimationConfig, AspectRatio, AssetKind, ImageSettings, ImageSize, Resolution, StyleType,
    VideoDuration, VideoSettings,
};
use crate::types::{AssetId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Configs
// ---------------------------------------------------------------------------

/// The resolved configuration a video was generated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAssetConfig {
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
    pub duration: VideoDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleType>,
}

impl VideoAssetConfig {
    pub fn from_settings(settings: &VideoSettings, style: StyleType) -> Self {
        Self {
            resolution: settings.resolution,
            aspect_ratio: settings.aspect_ratio,
            duration: settings.duration,
            animation: Some(settings.animation),
            style: Some(style),
        }
    }
}

/// The resolved configuration an image was generated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAssetConfig {
    pub image_size: ImageSize,
    pub aspect_ratio: AspectRatio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleType>,
}

impl ImageAssetConfig {
    pub fn from_settings(settings: &ImageSettings, style: StyleType) -> Self {
        Self {
            image_size: settings.image_size,
            aspect_ratio: settings.aspect_ratio,
            style: Some(style),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    pub id: AssetId,
    pub user_id: UserId,
    pub url: String,
    pub prompt: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
    pub config: VideoAssetConfig,
    /// Post-hoc analysis text, attached after generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: AssetId,
    pub user_id: UserId,
    pub url: String,
    pub prompt: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
    pub config: ImageAssetConfig,
}

/// A generated asset owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Asset {
    Video(GeneratedVideo),
    Image(GeneratedImage),
}

impl Asset {
    pub fn id(&self) -> AssetId {
        match self {
            Self::Video(v) => v.id,
            Self::Image(i) => i.id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Self::Video(v) => &v.user_id,
            Self::Image(i) => &i.user_id,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Video(v) => &v.url,
            Self::Image(i) => &i.url,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            Self::Video(v) => &v.prompt,
            Self::Image(i) => &i.prompt,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Video(v) => v.timestamp,
            Self::Image(i) => i.timestamp,
        }
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Video(_) => AssetKind::Video,
            Self::Image(_) => AssetKind::Image,
        }
    }

    /// Analysis text. Always `None` for images.
    pub fn analysis(&self) -> Option<&str> {
        match self {
            Self::Video(v) => v.analysis.as_deref(),
            Self::Image(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Per-user counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssetStats {
    pub total_videos: usize,
    pub total_images: usize,
}

impl AssetStats {
    pub fn from_assets(assets: &[Asset]) -> Self {
        assets.iter().fold(Self::default(), |mut acc, a| {
            match a.kind() {
                AssetKind::Video => acc.total_videos += 1,
                AssetKind::Image => acc.total_images += 1,
            }
            acc
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::generation::{CameraMove, MotionIntensity};

    fn sample_video() -> Asset {
        Asset::Video(GeneratedVideo {
            id: uuid::Uuid::nil(),
            user_id: "user-1".to_string(),
            url: "file:///tmp/a.mp4".to_string(),
            prompt: "a red cube spinning".to_string(),
            timestamp: chrono::Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            config: VideoAssetConfig {
                resolution: Resolution::P720,
                aspect_ratio: AspectRatio::Landscape,
                duration: VideoDuration::Secs5,
                animation: Some(AnimationConfig {
                    camera: CameraMove::PanLeft,
                    motion: MotionIntensity::Smooth,
                }),
                style: Some(StyleType::None),
            },
            analysis: None,
        })
    }

    #[test]
    fn video_json_layout() {
        let json = serde_json::to_value(sample_video()).unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["timestamp"], 1_700_000_000_123_i64);
        assert_eq!(json["config"]["resolution"], "720p");
        assert_eq!(json["config"]["aspectRatio"], "16:9");
        assert_eq!(json["config"]["duration"], "5s");
        assert_eq!(json["config"]["animation"]["camera"], "pan-left");
        assert!(json.get("analysis").is_none());
    }

    #[test]
    fn image_parses_from_stored_json() {
        let raw = r#"{
            "type": "image",
            "id": "00000000-0000-0000-0000-000000000001",
            "userId": "user-2",
            "url": "file:///tmp/b.png",
            "prompt": "a lighthouse",
            "timestamp": 1700000000000,
            "config": {"imageSize": "1K", "aspectRatio": "9:16", "style": "anime"}
        }"#;
        let asset: Asset = serde_json::from_str(raw).unwrap();
        assert_eq!(asset.kind(), AssetKind::Image);
        assert_eq!(asset.user_id(), "user-2");
        assert!(asset.analysis().is_none());
        match asset {
            Asset::Image(img) => {
                assert_eq!(img.config.image_size, ImageSize::K1);
                assert_eq!(img.config.aspect_ratio, AspectRatio::Portrait);
                assert_eq!(img.config.style, Some(StyleType::Anime));
            }
            other => panic!("Expected Image, got {other:?}"),
        }
    }

    #[test]
    fn video_without_optional_config_fields_parses() {
        let raw = r#"{
            "type": "video",
            "id": "00000000-0000-0000-0000-000000000002",
            "userId": "u",
            "url": "file:///tmp/c.mp4",
            "prompt": "p",
            "timestamp": 1,
            "config": {"resolution": "1080p", "aspectRatio": "16:9", "duration": "10m"},
            "analysis": "Moody, slow pans."
        }"#;
        let asset: Asset = serde_json::from_str(raw).unwrap();
        assert_eq!(asset.analysis(), Some("Moody, slow pans."));
    }

    #[test]
    fn stats_count_by_kind() {
        let mut image = serde_json::to_value(sample_video()).unwrap();
        image["type"] = "image".into();
        image["config"] = serde_json::json!({"imageSize": "2K", "aspectRatio": "16:9"});
        let image: Asset = serde_json::from_value(image).unwrap();

        let stats = AssetStats::from_assets(&[sample_video(), sample_video(), image]);
        assert_eq!(stats.total_videos, 2);
        assert_eq!(stats.total_images, 1);
    }

    #[test]
    fn config_from_settings_records_style_and_animation() {
        let cfg = VideoAssetConfig::from_settings(&VideoSettings::default(), StyleType::Anime);
        assert_eq!(cfg.style, Some(StyleType::Anime));
        assert_eq!(cfg.animation, Some(AnimationConfig::default()));
    }
}
