//! Generation settings vocabulary and the immutable [`GenerationRequest`].
//!
//! Every enum here serializes to the exact wire string the provider and
//! the persisted asset JSON use (`"720p"`, `"16:9"`, `"dolly-in"`, ...).
//! The same strings are accepted by [`FromStr`] so CLI flags and stored
//! records round-trip through one vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Parse `value` against the wire strings of every variant in `all`.
fn parse_wire<T: Copy>(
    value: &str,
    all: &[T],
    as_str: fn(T) -> &'static str,
    what: &str,
) -> Result<T, CoreError> {
    all.iter()
        .copied()
        .find(|v| as_str(*v) == value)
        .ok_or_else(|| {
            let valid: Vec<&str> = all.iter().map(|v| as_str(*v)).collect();
            CoreError::Validation(format!(
                "Invalid {what} '{value}'. Must be one of: {}",
                valid.join(", ")
            ))
        })
}

// ---------------------------------------------------------------------------
// Video settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    pub const ALL: &'static [Self] = &[Self::P720, Self::P1080];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub const ALL: &'static [Self] = &[Self::Landscape, Self::Portrait];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

/// Requested clip length bucket. Only baked into the prompt text; the
/// provider does not receive it as a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoDuration {
    #[serde(rename = "5s")]
    Secs5,
    #[serde(rename = "10s")]
    Secs10,
    #[serde(rename = "30s")]
    Secs30,
    #[serde(rename = "1m")]
    Mins1,
    #[serde(rename = "5m")]
    Mins5,
    #[serde(rename = "10m")]
    Mins10,
}

impl VideoDuration {
    pub const ALL: &'static [Self] = &[
        Self::Secs5,
        Self::Secs10,
        Self::Secs30,
        Self::Mins1,
        Self::Mins5,
        Self::Mins10,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secs5 => "5s",
            Self::Secs10 => "10s",
            Self::Secs30 => "30s",
            Self::Mins1 => "1m",
            Self::Mins5 => "5m",
            Self::Mins10 => "10m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraMove {
    None,
    ZoomIn,
    ZoomOut,
    PanRight,
    PanLeft,
    Orbit,
    TiltUp,
    DollyIn,
    DollyOut,
    CraneUp,
}

impl CameraMove {
    pub const ALL: &'static [Self] = &[
        Self::None,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::PanRight,
        Self::PanLeft,
        Self::Orbit,
        Self::TiltUp,
        Self::DollyIn,
        Self::DollyOut,
        Self::CraneUp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
            Self::PanRight => "pan-right",
            Self::PanLeft => "pan-left",
            Self::Orbit => "orbit",
            Self::TiltUp => "tilt-up",
            Self::DollyIn => "dolly-in",
            Self::DollyOut => "dolly-out",
            Self::CraneUp => "crane-up",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MotionIntensity {
    Subtle,
    Smooth,
    Dynamic,
    Chaotic,
    SlowMotion,
    FastForward,
}

impl MotionIntensity {
    pub const ALL: &'static [Self] = &[
        Self::Subtle,
        Self::Smooth,
        Self::Dynamic,
        Self::Chaotic,
        Self::SlowMotion,
        Self::FastForward,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subtle => "subtle",
            Self::Smooth => "smooth",
            Self::Dynamic => "dynamic",
            Self::Chaotic => "chaotic",
            Self::SlowMotion => "slow-motion",
            Self::FastForward => "fast-forward",
        }
    }
}

/// Camera and motion directives for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub camera: CameraMove,
    pub motion: MotionIntensity,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            camera: CameraMove::None,
            motion: MotionIntensity::Smooth,
        }
    }
}

// ---------------------------------------------------------------------------
// Image and shared settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1K")]
    K1,
    #[serde(rename = "2K")]
    K2,
    #[serde(rename = "4K")]
    K4,
}

impl ImageSize {
    pub const ALL: &'static [Self] = &[Self::K1, Self::K2, Self::K4];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::K1 => "1K",
            Self::K2 => "2K",
            Self::K4 => "4K",
        }
    }
}

/// Visual style preset. Each non-`None` preset appends a fixed modifier
/// to the prompt (see [`crate::prompt::style_modifier`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleType {
    #[default]
    None,
    Cartoon,
    Cinematic,
    Anime,
    Realistic,
    Render,
    Neon,
}

impl StyleType {
    pub const ALL: &'static [Self] = &[
        Self::None,
        Self::Cartoon,
        Self::Cinematic,
        Self::Anime,
        Self::Realistic,
        Self::Render,
        Self::Neon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cartoon => "cartoon",
            Self::Cinematic => "cinematic",
            Self::Anime => "anime",
            Self::Realistic => "realistic",
            Self::Render => "render",
            Self::Neon => "neon",
        }
    }
}

/// Asset type discriminator, also the generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Image,
}

impl AssetKind {
    pub const ALL: &'static [Self] = &[Self::Video, Self::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

macro_rules! impl_wire_traits {
    ($($ty:ty => $what:literal),* $(,)?) => {$(
        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_wire(s, Self::ALL, Self::as_str, $what)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

impl_wire_traits!(
    Resolution => "resolution",
    AspectRatio => "aspect ratio",
    VideoDuration => "duration",
    CameraMove => "camera movement",
    MotionIntensity => "motion intensity",
    ImageSize => "image size",
    StyleType => "style",
    AssetKind => "asset type",
);

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Settings for a polled video job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
    pub duration: VideoDuration,
    pub animation: AnimationConfig,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::P720,
            aspect_ratio: AspectRatio::Landscape,
            duration: VideoDuration::Secs5,
            animation: AnimationConfig::default(),
        }
    }
}

/// Settings for a single-shot image request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSettings {
    pub image_size: ImageSize,
    pub aspect_ratio: AspectRatio,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            image_size: ImageSize::K1,
            aspect_ratio: AspectRatio::Landscape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationTarget {
    Video(VideoSettings),
    Image(ImageSettings),
}

impl GenerationTarget {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Video(_) => AssetKind::Video,
            Self::Image(_) => AssetKind::Image,
        }
    }
}

/// Reference image used as the first frame of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl SeedImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/png".to_string(),
        }
    }
}

/// One user-initiated generation action.
///
/// Built once through the constructors and the consuming `with_*`
/// methods, then only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    style: StyleType,
    target: GenerationTarget,
    seed_image: Option<SeedImage>,
}

impl GenerationRequest {
    pub fn video(prompt: impl Into<String>, settings: VideoSettings) -> Self {
        Self {
            prompt: prompt.into(),
            style: StyleType::None,
            target: GenerationTarget::Video(settings),
            seed_image: None,
        }
    }

    pub fn image(prompt: impl Into<String>, settings: ImageSettings) -> Self {
        Self {
            prompt: prompt.into(),
            style: StyleType::None,
            target: GenerationTarget::Image(settings),
            seed_image: None,
        }
    }

    pub fn with_style(mut self, style: StyleType) -> Self {
        self.style = style;
        self
    }

    /// Attach a seed image. Only video jobs forward it to the provider.
    pub fn with_seed_image(mut self, seed: SeedImage) -> Self {
        self.seed_image = Some(seed);
        self
    }

    /// The prompt exactly as the user typed it.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn style(&self) -> StyleType {
        self.style
    }

    pub fn target(&self) -> &GenerationTarget {
        &self.target
    }

    pub fn kind(&self) -> AssetKind {
        self.target.kind()
    }

    pub fn seed_image(&self) -> Option<&SeedImage> {
        self.seed_image.as_ref()
    }

    pub fn video_settings(&self) -> Option<&VideoSettings> {
        match &self.target {
            GenerationTarget::Video(v) => Some(v),
            GenerationTarget::Image(_) => None,
        }
    }

    pub fn image_settings(&self) -> Option<&ImageSettings> {
        match &self.target {
            GenerationTarget::Image(i) => Some(i),
            GenerationTarget::Video(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject prompts that are empty after trimming whitespace.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation(
            "Prompt must not be empty".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
