/// Connection settings for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL without trailing slash (default:
    /// `https://generativelanguage.googleapis.com`).
    pub base_url: String,
    /// API key sent as `x-goog-api-key`. `None` means no credential has
    /// been selected yet.
    pub api_key: Option<String>,
    /// Model used for long-running video jobs.
    pub video_model: String,
    /// Model used for single-shot image generation.
    pub image_model: String,
    /// Model used for video analysis.
    pub analysis_model: String,
}

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-pro-preview";

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                                     |
    /// |-------------------------|---------------------------------------------|
    /// | `GEMINI_API_KEY`        | unset                                       |
    /// | `GEMINI_API_BASE_URL`   | `https://generativelanguage.googleapis.com` |
    /// | `LUMINA_VIDEO_MODEL`    | `veo-3.1-fast-generate-preview`             |
    /// | `LUMINA_IMAGE_MODEL`    | `gemini-3-pro-image-preview`                |
    /// | `LUMINA_ANALYSIS_MODEL` | `gemini-3-pro-preview`                      |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// key lookup, which keeps tests independent of process state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            base_url: non_empty("GEMINI_API_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: non_empty("GEMINI_API_KEY"),
            video_model: non_empty("LUMINA_VIDEO_MODEL").unwrap_or(defaults.video_model),
            image_model: non_empty("LUMINA_IMAGE_MODEL").unwrap_or(defaults.image_model),
            analysis_model: non_empty("LUMINA_ANALYSIS_MODEL").unwrap_or(defaults.analysis_model),
        }
    }
}
