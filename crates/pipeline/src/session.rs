//! Caller-side generation state machine.
//!
//! ```text
//!                 picker ok
//! AwaitingCredentials ──────► Idle ──submit──► Generating ──┬─► Completed ─┐
//!        ▲                     ▲                            ├─► Error ─────┤ display delay
//!        │                     └─────────────── cancelled ──┤              │
//!        └──────────────────────────────── auth rejected ───┘      Idle ◄──┘
//! ```
//!
//! The session owns the cancellation token for the run in flight, writes
//! exactly one asset per completed run, and publishes every transition on
//! the [`EventBus`]. Transient outcomes (completed, error, cancellation
//! notice) settle back to `Idle` once the display delay has elapsed; the
//! settling happens lazily when the state is next read.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use lumina_core::assets::{
    Asset, AssetStats, GeneratedImage, GeneratedVideo, ImageAssetConfig, VideoAssetConfig,
};
use lumina_core::generation::{validate_prompt, GenerationRequest, GenerationTarget};
use lumina_core::job_events::{
    EVT_ASSET_ANALYZED, EVT_GENERATION_AUTH_REQUIRED, EVT_GENERATION_CANCELLED,
    EVT_GENERATION_COMPLETED, EVT_GENERATION_FAILED, EVT_GENERATION_PROGRESS,
    EVT_GENERATION_STARTED,
};
use lumina_core::media::MediaHandle;
use lumina_core::progress::{ProgressTick, CANCELLED_MESSAGE, COMPLETE_MESSAGE};
use lumina_core::types::{validate_user_id, AssetId};
use lumina_events::{EventBus, GenerationEvent};
use lumina_provider::GenerationProvider;
use lumina_store::{AssetStore, MediaStore, StoreError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::analysis::VideoAnalyzer;
use crate::driver::{DriverConfig, JobDriver};
use crate::error::{GenerationError, SessionError};
use crate::gate::CredentialGate;
use crate::image::ImageGenerator;

/// Default time a completed/error/cancelled notice stays visible.
pub const DEFAULT_DISPLAY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub driver: DriverConfig,
    /// How long a transient outcome stays visible before the session
    /// settles back to `Idle`.
    pub display_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            display_delay: DEFAULT_DISPLAY_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No usable credentials; only the picker leaves this state.
    AwaitingCredentials,
    Idle,
    Generating,
    Completed,
    Error,
}

/// What a call to [`GenerationSession::generate`] ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The asset was persisted and prepended to the user's list.
    Completed(Asset),
    Cancelled,
    /// Provider failure, with the text to show the user.
    Failed(String),
    /// Credentials were rejected; [`GenerationSession::reauthorize`] must
    /// succeed before the next submission.
    AuthRequired,
}

struct Inner {
    user: Option<String>,
    state: SessionState,
    notice: Option<String>,
    progress: Option<ProgressTick>,
    cancel: Option<CancellationToken>,
    /// When the current transient notice was shown.
    shown_at: Option<Instant>,
}

impl Inner {
    fn settle(&mut self, delay: Duration) {
        let Some(shown_at) = self.shown_at else {
            return;
        };
        if shown_at.elapsed() < delay {
            return;
        }
        if matches!(self.state, SessionState::Completed | SessionState::Error) {
            self.state = SessionState::Idle;
        }
        self.notice = None;
        self.progress = None;
        self.shown_at = None;
    }

    fn show(&mut self, state: SessionState, notice: impl Into<String>) {
        self.state = state;
        self.notice = Some(notice.into());
        self.shown_at = Some(Instant::now());
        self.cancel = None;
    }

    fn signed_in_user(&self) -> Result<String, SessionError> {
        self.user.clone().ok_or(SessionError::NotSignedIn)
    }
}

pub struct GenerationSession {
    driver: JobDriver,
    images: ImageGenerator,
    analyzer: VideoAnalyzer,
    assets: Arc<dyn AssetStore>,
    media: Arc<dyn MediaStore>,
    gate: Arc<dyn CredentialGate>,
    events: Arc<EventBus>,
    display_delay: Duration,
    inner: Mutex<Inner>,
}

impl GenerationSession {
    /// Build a session. It starts in `AwaitingCredentials` when the gate
    /// reports no credentials, `Idle` otherwise.
    pub async fn start(
        provider: Arc<dyn GenerationProvider>,
        assets: Arc<dyn AssetStore>,
        media: Arc<dyn MediaStore>,
        gate: Arc<dyn CredentialGate>,
        events: Arc<EventBus>,
        config: SessionConfig,
    ) -> Self {
        let state = if gate.has_valid_credentials().await {
            SessionState::Idle
        } else {
            tracing::info!("No credentials selected");
            SessionState::AwaitingCredentials
        };

        Self {
            driver: JobDriver::new(Arc::clone(&provider), config.driver),
            images: ImageGenerator::new(Arc::clone(&provider)),
            analyzer: VideoAnalyzer::new(provider, Arc::clone(&media)),
            assets,
            media,
            gate,
            events,
            display_delay: config.display_delay,
            inner: Mutex::new(Inner {
                user: None,
                state,
                notice: None,
                progress: None,
                cancel: None,
                shown_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settled(&self) -> MutexGuard<'_, Inner> {
        let mut inner = self.lock();
        inner.settle(self.display_delay);
        inner
    }

    // -- identity --

    /// Sign in as `user_id`. Ids must be usable as asset-store keys, so a
    /// bad id is rejected here rather than after a finished job.
    pub fn sign_in(&self, user_id: &str) -> Result<(), SessionError> {
        let user_id = user_id.trim();
        validate_user_id(user_id)?;
        let mut inner = self.lock();
        if inner.state == SessionState::Generating {
            return Err(SessionError::Busy);
        }
        inner.user = Some(user_id.to_string());
        tracing::info!(user_id, "Signed in");
        Ok(())
    }

    /// Sign out, cancelling any run in flight.
    pub fn sign_out(&self) {
        let mut inner = self.lock();
        if let Some(cancel) = &inner.cancel {
            cancel.cancel();
        }
        if let Some(user_id) = inner.user.take() {
            tracing::info!(user_id = %user_id, "Signed out");
        }
    }

    pub fn current_user(&self) -> Option<String> {
        self.lock().user.clone()
    }

    // -- credentials --

    /// Open the credential picker. On success the session leaves
    /// `AwaitingCredentials`.
    pub async fn reauthorize(&self) -> bool {
        let granted = self.gate.open_credential_picker().await;
        let mut inner = self.lock();
        if granted && inner.state == SessionState::AwaitingCredentials {
            inner.state = SessionState::Idle;
            tracing::info!("Credentials selected");
        }
        granted
    }

    // -- observation --

    pub fn state(&self) -> SessionState {
        self.settled().state
    }

    /// The transient notice currently shown, if any.
    pub fn notice(&self) -> Option<String> {
        self.settled().notice.clone()
    }

    /// The most recent progress tick of the current or just-finished run.
    pub fn progress(&self) -> Option<ProgressTick> {
        self.settled().progress.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.lock().state == SessionState::Generating
    }

    // -- generation --

    /// Run one generation for the signed-in user.
    ///
    /// Precondition failures (not signed in, empty prompt, credentials
    /// missing, another run in flight) are errors and leave the state
    /// untouched. Every run that starts ends in exactly one
    /// [`GenerationOutcome`].
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, SessionError> {
        {
            let inner = self.settled();
            inner.signed_in_user()?;
            Self::check_ready(&inner)?;
        }
        validate_prompt(request.prompt())?;

        if !self.gate.has_valid_credentials().await {
            let user_id = {
                let mut inner = self.lock();
                inner.state = SessionState::AwaitingCredentials;
                inner.user.clone()
            };
            self.publish(EVT_GENERATION_AUTH_REQUIRED, user_id.as_deref());
            return Err(SessionError::CredentialsRequired);
        }

        let (user_id, cancel) = self.begin()?;
        self.events.publish(
            GenerationEvent::new(EVT_GENERATION_STARTED)
                .with_user(user_id.as_str())
                .with_payload(serde_json::json!({
                    "kind": request.kind().as_str(),
                    "prompt": request.prompt(),
                })),
        );
        tracing::info!(user_id = %user_id, kind = %request.kind(), "Generation started");

        let mut reporter = |tick: &ProgressTick| self.record_progress(&user_id, tick);
        let result = match request.target() {
            GenerationTarget::Video(_) => {
                self.driver
                    .submit_and_await(&request, &mut reporter, &cancel)
                    .await
            }
            GenerationTarget::Image(_) => {
                self.images.generate(&request, &mut reporter, &cancel).await
            }
        };

        self.finish(&user_id, &request, result).await
    }

    /// Request cancellation of the run in flight. Returns `false` when
    /// nothing is running.
    pub fn cancel(&self) -> bool {
        let inner = self.lock();
        match &inner.cancel {
            Some(cancel) => {
                cancel.cancel();
                tracing::info!("Cancellation requested");
                true
            }
            None => false,
        }
    }

    fn check_ready(inner: &Inner) -> Result<(), SessionError> {
        match inner.state {
            SessionState::AwaitingCredentials => Err(SessionError::CredentialsRequired),
            SessionState::Generating => Err(SessionError::Busy),
            _ => Ok(()),
        }
    }

    /// Enter `Generating` with a fresh token.
    fn begin(&self) -> Result<(String, CancellationToken), SessionError> {
        let mut inner = self.settled();
        let user_id = inner.signed_in_user()?;
        Self::check_ready(&inner)?;

        let cancel = CancellationToken::new();
        inner.state = SessionState::Generating;
        inner.notice = None;
        inner.progress = None;
        inner.shown_at = None;
        inner.cancel = Some(cancel.clone());
        Ok((user_id, cancel))
    }

    fn record_progress(&self, user_id: &str, tick: &ProgressTick) {
        self.lock().progress = Some(tick.clone());
        self.events.publish(
            GenerationEvent::new(EVT_GENERATION_PROGRESS)
                .with_user(user_id)
                .with_tick(tick),
        );
    }

    async fn finish(
        &self,
        user_id: &str,
        request: &GenerationRequest,
        result: Result<MediaHandle, GenerationError>,
    ) -> Result<GenerationOutcome, SessionError> {
        match result {
            Ok(media) => match self.persist(user_id, request, media).await {
                Ok(asset) => {
                    let tick = ProgressTick::complete();
                    {
                        let mut inner = self.lock();
                        inner.progress = Some(tick.clone());
                        inner.show(SessionState::Completed, COMPLETE_MESSAGE);
                    }
                    self.events.publish(
                        GenerationEvent::new(EVT_GENERATION_PROGRESS)
                            .with_user(user_id)
                            .with_tick(&tick),
                    );
                    self.events.publish(
                        GenerationEvent::new(EVT_GENERATION_COMPLETED)
                            .with_user(user_id)
                            .with_asset(asset.id())
                            .with_payload(serde_json::json!({
                                "kind": asset.kind().as_str(),
                                "url": asset.url(),
                            })),
                    );
                    tracing::info!(user_id, asset_id = %asset.id(), "Generation completed");
                    Ok(GenerationOutcome::Completed(asset))
                }
                Err(e) => {
                    tracing::error!(user_id, error = %e, "Failed to persist generated asset");
                    self.lock().show(SessionState::Error, e.to_string());
                    self.publish_failed(user_id, &e.to_string());
                    Err(e)
                }
            },
            Err(GenerationError::Cancelled) => {
                self.lock().show(SessionState::Idle, CANCELLED_MESSAGE);
                self.publish(EVT_GENERATION_CANCELLED, Some(user_id));
                tracing::info!(user_id, "Generation cancelled");
                Ok(GenerationOutcome::Cancelled)
            }
            Err(GenerationError::AuthError(detail)) => {
                {
                    let mut inner = self.lock();
                    inner.state = SessionState::AwaitingCredentials;
                    inner.notice = None;
                    inner.progress = None;
                    inner.shown_at = None;
                    inner.cancel = None;
                }
                self.publish(EVT_GENERATION_AUTH_REQUIRED, Some(user_id));
                tracing::warn!(user_id, detail = %detail, "Credentials rejected by provider");
                Ok(GenerationOutcome::AuthRequired)
            }
            Err(GenerationError::Busy) => {
                let mut inner = self.lock();
                inner.state = SessionState::Idle;
                inner.cancel = None;
                Err(SessionError::Busy)
            }
            Err(other) => {
                let message = other.user_message();
                tracing::error!(user_id, error = %other, "Generation failed");
                self.lock().show(SessionState::Error, message.as_str());
                self.publish_failed(user_id, &message);
                Ok(GenerationOutcome::Failed(message))
            }
        }
    }

    /// Materialize the artifact and record the asset at the front of the
    /// user's list.
    async fn persist(
        &self,
        user_id: &str,
        request: &GenerationRequest,
        media: MediaHandle,
    ) -> Result<Asset, SessionError> {
        let id = AssetId::new_v4();
        let url = self.media.save(id, &media).await?;

        let asset = match request.target() {
            GenerationTarget::Video(settings) => Asset::Video(GeneratedVideo {
                id,
                user_id: user_id.to_string(),
                url,
                prompt: request.prompt().to_string(),
                timestamp: Utc::now(),
                config: VideoAssetConfig::from_settings(settings, request.style()),
                analysis: None,
            }),
            GenerationTarget::Image(settings) => Asset::Image(GeneratedImage {
                id,
                user_id: user_id.to_string(),
                url,
                prompt: request.prompt().to_string(),
                timestamp: Utc::now(),
                config: ImageAssetConfig::from_settings(settings, request.style()),
            }),
        };

        if let Err(e) = self.assets.append(user_id, asset.clone()).await {
            if let Err(cleanup) = self.media.remove(asset.url()).await {
                tracing::warn!(asset_id = %id, error = %cleanup, "Failed to remove orphaned media");
            }
            return Err(e.into());
        }
        Ok(asset)
    }

    fn publish(&self, event_type: &str, user_id: Option<&str>) {
        let mut event = GenerationEvent::new(event_type);
        if let Some(user_id) = user_id {
            event = event.with_user(user_id);
        }
        self.events.publish(event);
    }

    fn publish_failed(&self, user_id: &str, message: &str) {
        self.events.publish(
            GenerationEvent::new(EVT_GENERATION_FAILED)
                .with_user(user_id)
                .with_payload(serde_json::json!({ "message": message })),
        );
    }

    // -- asset history --

    /// The signed-in user's assets, most recent first.
    pub async fn assets(&self) -> Result<Vec<Asset>, SessionError> {
        let user_id = self.lock().signed_in_user()?;
        Ok(self.assets.load(&user_id).await?)
    }

    pub async fn stats(&self) -> Result<AssetStats, SessionError> {
        Ok(AssetStats::from_assets(&self.assets().await?))
    }

    /// Remove all of the signed-in user's assets.
    pub async fn clear_assets(&self) -> Result<(), SessionError> {
        let user_id = self.lock().signed_in_user()?;
        self.assets.clear(&user_id).await?;
        Ok(())
    }

    /// Analyze one of the signed-in user's videos and attach the result to
    /// the stored asset.
    pub async fn analyze(&self, asset_id: AssetId) -> Result<String, SessionError> {
        let user_id = self.lock().signed_in_user()?;
        let asset = self
            .assets
            .load(&user_id)
            .await?
            .into_iter()
            .find(|a| a.id() == asset_id)
            .ok_or(StoreError::AssetNotFound(asset_id))?;

        let analysis = match self.analyzer.analyze(&asset).await {
            Ok(text) => text,
            Err(SessionError::Generation(GenerationError::AuthError(detail))) => {
                self.lock().state = SessionState::AwaitingCredentials;
                self.publish(EVT_GENERATION_AUTH_REQUIRED, Some(&user_id));
                return Err(GenerationError::AuthError(detail).into());
            }
            Err(e) => return Err(e),
        };

        self.assets
            .attach_analysis(&user_id, asset_id, &analysis)
            .await?;
        self.events.publish(
            GenerationEvent::new(EVT_ASSET_ANALYZED)
                .with_user(user_id.as_str())
                .with_asset(asset_id),
        );
        tracing::info!(user_id = %user_id, %asset_id, "Analysis attached");
        Ok(analysis)
    }
}
