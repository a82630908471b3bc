use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lumina_core::generation::{
    AnimationConfig, AspectRatio, AssetKind, CameraMove, GenerationRequest, ImageSettings,
    MotionIntensity, Resolution, SeedImage, StyleType, VideoDuration, VideoSettings,
};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "lumina-studio")]
#[command(version)]
#[command(about = "Generate stylized 3D videos and images with Gemini", long_about = None)]
pub struct Cli {
    /// User whose asset history is read and written
    #[arg(long, global = true, default_value = "local")]
    pub user: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a video or an image from a prompt
    Generate(GenerateArgs),
    /// List stored assets, most recent first
    List,
    /// Delete every stored asset of the user
    Clear,
    /// Describe a stored video with the analysis model
    Analyze {
        /// Id printed by `generate` or `list`
        asset_id: Uuid,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Scene description
    pub prompt: String,

    /// `video` or `image`
    #[arg(long, default_value_t = AssetKind::Video)]
    pub mode: AssetKind,

    /// Style preset: none, cartoon, cinematic, anime, realistic, render, neon
    #[arg(long, default_value_t = StyleType::None)]
    pub style: StyleType,

    /// Camera movement (video only), e.g. orbit, dolly-in, crane-up
    #[arg(long, default_value_t = CameraMove::None)]
    pub camera: CameraMove,

    /// Motion intensity (video only), e.g. subtle, dynamic, slow-motion
    #[arg(long, default_value_t = MotionIntensity::Smooth)]
    pub motion: MotionIntensity,

    /// Target length (video only): 5s, 10s, 30s, 1m, 5m, 10m
    #[arg(long, default_value_t = VideoDuration::Secs5)]
    pub duration: VideoDuration,

    /// 720p or 1080p (video only)
    #[arg(long, default_value_t = Resolution::P720)]
    pub resolution: Resolution,

    /// 16:9 or 9:16
    #[arg(long, default_value_t = AspectRatio::Landscape)]
    pub aspect_ratio: AspectRatio,

    /// PNG, JPEG or WebP used as the first frame (video only)
    #[arg(long)]
    pub seed_image: Option<PathBuf>,

    /// Run video analysis on the result once it is stored
    #[arg(long)]
    pub analyze: bool,
}

impl GenerateArgs {
    /// Build the request. `seed` is the already-loaded `--seed-image`.
    pub fn request(&self, seed: Option<SeedImage>) -> GenerationRequest {
        let request = match self.mode {
            AssetKind::Video => GenerationRequest::video(
                self.prompt.as_str(),
                VideoSettings {
                    resolution: self.resolution,
                    aspect_ratio: self.aspect_ratio,
                    duration: self.duration,
                    animation: AnimationConfig {
                        camera: self.camera,
                        motion: self.motion,
                    },
                },
            ),
            AssetKind::Image => GenerationRequest::image(
                self.prompt.as_str(),
                ImageSettings {
                    aspect_ratio: self.aspect_ratio,
                    ..ImageSettings::default()
                },
            ),
        }
        .with_style(self.style);

        match seed {
            Some(seed) => request.with_seed_image(seed),
            None => request,
        }
    }
}

/// MIME type for a seed image, from its file extension.
pub fn seed_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
