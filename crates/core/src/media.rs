//! Materialized artifact bytes returned by a finished job.

use crate::generation::AssetKind;

pub const MIME_VIDEO_MP4: &str = "video/mp4";
pub const MIME_IMAGE_PNG: &str = "image/png";

/// A playable/viewable artifact held in memory until it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    pub kind: AssetKind,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaHandle {
    pub fn video(bytes: Vec<u8>) -> Self {
        Self {
            kind: AssetKind::Video,
            mime_type: MIME_VIDEO_MP4.to_string(),
            bytes,
        }
    }

    pub fn image(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Image,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// File extension matching the mime type, without the dot.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => match self.kind {
                AssetKind::Video => "mp4",
                AssetKind::Image => "bin",
            },
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
