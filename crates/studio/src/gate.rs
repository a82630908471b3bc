//! Credential gate backed by the process environment.
//!
//! A terminal has no key-selection dialog, so "opening the picker" means
//! telling the user where the key goes and re-reading it from `.env` and
//! the environment.

use std::sync::Arc;

use async_trait::async_trait;
use lumina_pipeline::CredentialGate;
use lumina_provider::GeminiApi;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

type KeySource = Box<dyn Fn() -> Option<String> + Send + Sync>;

pub struct EnvCredentialGate {
    api: Arc<GeminiApi>,
    source: KeySource,
}

impl EnvCredentialGate {
    /// Re-reads `GEMINI_API_KEY` from `.env` (overriding the process
    /// environment) every time the picker is opened.
    pub fn new(api: Arc<GeminiApi>) -> Self {
        Self::with_source(api, || {
            dotenvy::dotenv_override().ok();
            std::env::var(API_KEY_VAR).ok()
        })
    }

    pub fn with_source(
        api: Arc<GeminiApi>,
        source: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            api,
            source: Box::new(source),
        }
    }
}

#[async_trait]
impl CredentialGate for EnvCredentialGate {
    async fn has_valid_credentials(&self) -> bool {
        self.api.has_api_key()
    }

    async fn open_credential_picker(&self) -> bool {
        let key = (self.source)().filter(|k| !k.trim().is_empty());
        let Some(key) = key else {
            tracing::warn!(
                var = API_KEY_VAR,
                "No API key found. Set it in the environment or in .env"
            );
            return false;
        };

        self.api.set_api_key(Some(key));
        tracing::info!("API key selected");
        true
    }
}

#[cfg(test)]
mod tests {
    use lumina_provider::ProviderConfig;

    use super::*;

    fn api(key: Option<&str>) -> Arc<GeminiApi> {
        Arc::new(GeminiApi::new(ProviderConfig {
            api_key: key.map(str::to_string),
            ..ProviderConfig::default()
        }))
    }

    #[tokio::test]
    async fn reports_configured_key() {
        let gate = EnvCredentialGate::with_source(api(Some("abc")), || None);
        assert!(gate.has_valid_credentials().await);

        let gate = EnvCredentialGate::with_source(api(None), || None);
        assert!(!gate.has_valid_credentials().await);
    }

    #[tokio::test]
    async fn picker_installs_key_from_source() {
        let api = api(None);
        let gate = EnvCredentialGate::with_source(Arc::clone(&api), || Some("fresh".into()));

        assert!(gate.open_credential_picker().await);
        assert!(api.has_api_key());
        assert!(gate.has_valid_credentials().await);
    }

    #[tokio::test]
    async fn picker_declines_when_key_missing_or_blank() {
        let gate = EnvCredentialGate::with_source(api(None), || None);
        assert!(!gate.open_credential_picker().await);

        let gate = EnvCredentialGate::with_source(api(None), || Some("   ".into()));
        assert!(!gate.open_credential_picker().await);
        assert!(!gate.has_valid_credentials().await);
    }

    #[tokio::test]
    async fn declined_picker_keeps_existing_key() {
        let api = api(Some("old"));
        let gate = EnvCredentialGate::with_source(Arc::clone(&api), || None);

        assert!(!gate.open_credential_picker().await);
        assert!(api.has_api_key());
    }
}
