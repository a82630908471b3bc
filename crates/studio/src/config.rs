use std::path::PathBuf;
use std::time::Duration;

use lumina_pipeline::{DriverConfig, SessionConfig};
use lumina_provider::ProviderConfig;

/// Raised when an environment variable holds a value that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be an integer >= {min}, got '{value}'")]
    InvalidNumber {
        key: &'static str,
        value: String,
        min: u64,
    },
}

/// Studio configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub provider: ProviderConfig,
    /// Delay between two status polls of a video job.
    pub poll_interval: Duration,
    /// Give up after this many polls. `None` polls until the job finishes.
    pub max_polls: Option<u32>,
    /// Root for the asset lists and downloaded media.
    pub data_dir: PathBuf,
    /// How long a completed/error notice stays up before settling to idle.
    pub display_delay: Duration,
}

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_DISPLAY_DELAY_SECS: u64 = 3;
pub const DEFAULT_DATA_DIR: &str = "./lumina-data";

impl StudioConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default         |
    /// |------------------------------|-----------------|
    /// | `LUMINA_POLL_INTERVAL_SECS`  | `10`            |
    /// | `LUMINA_MAX_POLLS`           | unbounded       |
    /// | `LUMINA_DATA_DIR`            | `./lumina-data` |
    /// | `LUMINA_DISPLAY_DELAY_SECS`  | `3`             |
    ///
    /// Provider variables are documented on [`ProviderConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let poll_interval = number(
            "LUMINA_POLL_INTERVAL_SECS",
            non_empty("LUMINA_POLL_INTERVAL_SECS"),
            1,
        )?
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let max_polls = number("LUMINA_MAX_POLLS", non_empty("LUMINA_MAX_POLLS"), 1)?
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX));

        let display_delay = number(
            "LUMINA_DISPLAY_DELAY_SECS",
            non_empty("LUMINA_DISPLAY_DELAY_SECS"),
            0,
        )?
        .unwrap_or(DEFAULT_DISPLAY_DELAY_SECS);

        Ok(Self {
            provider: ProviderConfig::from_lookup(&lookup),
            poll_interval: Duration::from_secs(poll_interval),
            max_polls,
            data_dir: non_empty("LUMINA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            display_delay: Duration::from_secs(display_delay),
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            driver: DriverConfig {
                poll_interval: self.poll_interval,
                max_polls: self.max_polls,
            },
            display_delay: self.display_delay,
        }
    }

    /// Directory holding one `<user>.json` asset list per user.
    pub fn assets_dir(&self) -> PathBuf {
        self.data_dir.join("assets")
    }

    /// Directory holding downloaded videos and images.
    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }
}

fn number(key: &'static str, raw: Option<String>, min: u64) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n >= min => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: raw,
            min,
        }),
    }
}
