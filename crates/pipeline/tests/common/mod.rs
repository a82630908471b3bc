//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lumina_core::generation::{AspectRatio, ImageSize, Resolution, SeedImage};
use lumina_core::progress::ProgressTick;
use lumina_events::EventBus;
use lumina_pipeline::{CredentialGate, GenerationSession, SessionConfig};
use lumina_provider::{GenerationProvider, JobHandle, ProviderError};
use lumina_store::{AssetStore, InMemoryAssetStore, InMemoryMediaStore, MediaStore};
use tokio_util::sync::CancellationToken;

pub const JOB_NAME: &str = "models/veo/operations/test-op";
pub const ARTIFACT_URI: &str = "https://fake.test/files/video.mp4";
pub const AUTH_REJECTION: &str = "Requested entity was not found.";

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SubmitVideo {
        prompt: String,
        seeded: bool,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    },
    Poll(u32),
    Fetch(String),
    SubmitImage {
        prompt: String,
        image_size: ImageSize,
        aspect_ratio: AspectRatio,
    },
    Analyze(usize),
}

/// Where the fake provider should trip the cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelPoint {
    /// While the submit call is in flight.
    DuringSubmit,
    /// While the given (1-based) poll call is in flight.
    DuringPoll(u32),
    /// While the artifact download is in flight.
    DuringFetch,
    /// While the image request is in flight.
    DuringImage,
}

/// Scripted failure, built fresh each time since `ProviderError` is not
/// `Clone`.
#[derive(Debug, Clone)]
pub enum Failure {
    Api { status: u16, body: String },
    Operation { code: i32, message: String },
}

impl Failure {
    pub fn auth() -> Self {
        Self::Api {
            status: 404,
            body: AUTH_REJECTION.to_string(),
        }
    }

    pub fn server(body: &str) -> Self {
        Self::Api {
            status: 500,
            body: body.to_string(),
        }
    }

    fn to_error(&self) -> ProviderError {
        match self {
            Self::Api { status, body } => ProviderError::ApiError {
                status: *status,
                body: body.clone(),
            },
            Self::Operation { code, message } => ProviderError::Operation {
                code: *code,
                message: message.clone(),
            },
        }
    }
}

/// In-memory [`GenerationProvider`] that follows a script and records
/// every call.
pub struct FakeProvider {
    polls_until_done: u32,
    locator: Option<String>,
    artifact: Vec<u8>,
    image: Vec<u8>,
    analysis: Option<String>,
    submit_failure: Option<Failure>,
    poll_failure: Option<(u32, Failure)>,
    fetch_failure: Option<Failure>,
    image_failure: Option<Failure>,
    image_latency: Option<Duration>,
    cancel_at: Option<(CancelPoint, CancellationToken)>,
    polls: Mutex<u32>,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            polls_until_done: 2,
            locator: Some(ARTIFACT_URI.to_string()),
            artifact: b"mp4-bytes".to_vec(),
            image: b"png-bytes".to_vec(),
            analysis: Some("A red cube rotating on a studio floor.".to_string()),
            submit_failure: None,
            poll_failure: None,
            fetch_failure: None,
            image_failure: None,
            image_latency: None,
            cancel_at: None,
            polls: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The job reports done on the `polls`-th poll (0 = done at submit).
    pub fn done_after(mut self, polls: u32) -> Self {
        self.polls_until_done = polls;
        self
    }

    pub fn without_locator(mut self) -> Self {
        self.locator = None;
        self
    }

    pub fn with_artifact(mut self, bytes: &[u8]) -> Self {
        self.artifact = bytes.to_vec();
        self
    }

    pub fn with_analysis(mut self, text: Option<&str>) -> Self {
        self.analysis = text.map(str::to_string);
        self
    }

    pub fn fail_submit(mut self, failure: Failure) -> Self {
        self.submit_failure = Some(failure);
        self
    }

    /// Fail the given (1-based) poll.
    pub fn fail_poll(mut self, poll: u32, failure: Failure) -> Self {
        self.poll_failure = Some((poll, failure));
        self
    }

    pub fn fail_fetch(mut self, failure: Failure) -> Self {
        self.fetch_failure = Some(failure);
        self
    }

    pub fn fail_image(mut self, failure: Failure) -> Self {
        self.image_failure = Some(failure);
        self
    }

    /// Hold the image request open for `latency` (virtual time under
    /// `start_paused`).
    pub fn image_latency(mut self, latency: Duration) -> Self {
        self.image_latency = Some(latency);
        self
    }

    pub fn cancel_at(mut self, point: CancelPoint, token: CancellationToken) -> Self {
        self.cancel_at = Some((point, token));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn poll_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Poll(_)))
            .count()
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn maybe_cancel(&self, point: CancelPoint) {
        if let Some((at, token)) = &self.cancel_at {
            if *at == point {
                token.cancel();
            }
        }
    }

    fn handle_after(&self, polls: u32) -> JobHandle {
        if polls >= self.polls_until_done {
            JobHandle::finished(JOB_NAME, self.locator.clone())
        } else {
            JobHandle::pending(JOB_NAME)
        }
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn submit_video_job(
        &self,
        prompt: &str,
        seed_image: Option<&SeedImage>,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    ) -> Result<JobHandle, ProviderError> {
        self.record(Call::SubmitVideo {
            prompt: prompt.to_string(),
            seeded: seed_image.is_some(),
            resolution,
            aspect_ratio,
        });
        self.maybe_cancel(CancelPoint::DuringSubmit);
        if let Some(failure) = &self.submit_failure {
            return Err(failure.to_error());
        }
        Ok(self.handle_after(0))
    }

    async fn poll_job(&self, handle: &JobHandle) -> Result<JobHandle, ProviderError> {
        assert_eq!(handle.name(), JOB_NAME);
        let n = {
            let mut polls = self.polls.lock().unwrap();
            *polls += 1;
            *polls
        };
        self.record(Call::Poll(n));
        self.maybe_cancel(CancelPoint::DuringPoll(n));
        if let Some((at, failure)) = &self.poll_failure {
            if *at == n {
                return Err(failure.to_error());
            }
        }
        Ok(self.handle_after(n))
    }

    async fn fetch_artifact(&self, locator: &str) -> Result<Vec<u8>, ProviderError> {
        self.record(Call::Fetch(locator.to_string()));
        self.maybe_cancel(CancelPoint::DuringFetch);
        if let Some(failure) = &self.fetch_failure {
            return Err(failure.to_error());
        }
        Ok(self.artifact.clone())
    }

    async fn submit_image_job(
        &self,
        prompt: &str,
        image_size: ImageSize,
        aspect_ratio: AspectRatio,
    ) -> Result<(Vec<u8>, String), ProviderError> {
        self.record(Call::SubmitImage {
            prompt: prompt.to_string(),
            image_size,
            aspect_ratio,
        });
        self.maybe_cancel(CancelPoint::DuringImage);
        if let Some(latency) = self.image_latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(failure) = &self.image_failure {
            return Err(failure.to_error());
        }
        Ok((self.image.clone(), "image/png".to_string()))
    }

    async fn analyze_video(
        &self,
        video: &[u8],
        _mime_type: &str,
    ) -> Result<Option<String>, ProviderError> {
        self.record(Call::Analyze(video.len()));
        Ok(self.analysis.clone())
    }
}

/// Credential gate with a fixed answer and a scripted picker.
pub struct StaticCredentialGate {
    valid: AtomicBool,
    picker_grants: bool,
}

impl StaticCredentialGate {
    pub fn new(valid: bool, picker_grants: bool) -> Self {
        Self {
            valid: AtomicBool::new(valid),
            picker_grants,
        }
    }

    pub fn valid() -> Self {
        Self::new(true, true)
    }
}

#[async_trait]
impl CredentialGate for StaticCredentialGate {
    async fn has_valid_credentials(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    async fn open_credential_picker(&self) -> bool {
        if self.picker_grants {
            self.valid.store(true, Ordering::SeqCst);
        }
        self.picker_grants
    }
}

/// Collects every tick a run reports.
pub fn tick_collector() -> (Arc<Mutex<Vec<ProgressTick>>>, impl FnMut(&ProgressTick) + Send) {
    let ticks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ticks);
    (ticks, move |tick: &ProgressTick| {
        sink.lock().unwrap().push(tick.clone())
    })
}

pub fn percents(ticks: &Mutex<Vec<ProgressTick>>) -> Vec<u8> {
    ticks.lock().unwrap().iter().map(|t| t.percent).collect()
}

/// Everything a session test needs to inspect after a run.
pub struct Harness {
    pub session: Arc<GenerationSession>,
    pub provider: Arc<FakeProvider>,
    pub assets: Arc<InMemoryAssetStore>,
    pub media: Arc<InMemoryMediaStore>,
    pub events: Arc<EventBus>,
}

pub async fn harness(provider: FakeProvider, gate: StaticCredentialGate) -> Harness {
    let provider = Arc::new(provider);
    let assets = Arc::new(InMemoryAssetStore::new());
    let media = Arc::new(InMemoryMediaStore::new());
    let events = Arc::new(EventBus::default());

    let session = start_session(
        &provider,
        Arc::clone(&assets) as Arc<dyn AssetStore>,
        Arc::clone(&media) as Arc<dyn MediaStore>,
        gate,
        &events,
    )
    .await;

    Harness {
        session: Arc::new(session),
        provider,
        assets,
        media,
        events,
    }
}

/// Session over arbitrary stores, for tests that need the file-backed ones.
pub async fn start_session(
    provider: &Arc<FakeProvider>,
    assets: Arc<dyn AssetStore>,
    media: Arc<dyn MediaStore>,
    gate: StaticCredentialGate,
    events: &Arc<EventBus>,
) -> GenerationSession {
    GenerationSession::start(
        Arc::clone(provider) as Arc<dyn GenerationProvider>,
        assets,
        media,
        Arc::new(gate),
        Arc::clone(events),
        SessionConfig::default(),
    )
    .await
}
