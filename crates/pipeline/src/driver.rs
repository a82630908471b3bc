//! Long-running video job driver.
//!
//! [`JobDriver::submit_and_await`] submits a job, polls it at a fixed
//! interval until the provider reports it done, then downloads the
//! artifact. Progress is reported through a [`ProgressReporter`] and the
//! caller's [`CancellationToken`] is checked at every suspension point:
//!
//! 1. before submitting,
//! 2. at the top of each poll iteration,
//! 3. after each inter-poll wait,
//! 4. after the job reports done, before fetching,
//! 5. after the fetch, before returning.
//!
//! Cancellation is cooperative. An in-flight provider call is never
//! interrupted; the next checkpoint after it returns stops the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lumina_core::generation::GenerationRequest;
use lumina_core::media::MediaHandle;
use lumina_core::progress::{poll_tick, MonotonicReporter, ProgressReporter, ProgressTick};
use lumina_core::prompt::compose_prompt;
use lumina_provider::GenerationProvider;
use tokio_util::sync::CancellationToken;

use crate::error::{classify_provider_error, GenerationError};

/// Default wait between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Tunable parameters for the poll loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Wait between two polls of the provider.
    pub poll_interval: Duration,
    /// Give up with [`GenerationError::TimedOut`] after this many polls.
    /// `None` polls until the job finishes or is cancelled.
    pub max_polls: Option<u32>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
        }
    }
}

/// Drives at most one video job at a time against a provider.
pub struct JobDriver {
    provider: Arc<dyn GenerationProvider>,
    config: DriverConfig,
    busy: AtomicBool,
}

/// Clears the driver's busy flag when the run ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), GenerationError> {
    if cancel.is_cancelled() {
        Err(GenerationError::Cancelled)
    } else {
        Ok(())
    }
}

impl JobDriver {
    pub fn new(provider: Arc<dyn GenerationProvider>, config: DriverConfig) -> Self {
        Self {
            provider,
            config,
            busy: AtomicBool::new(false),
        }
    }

    /// Whether a job is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one video request to completion.
    ///
    /// Reported percentages never decrease, and nothing is reported after
    /// this returns. Once cancellation is observed no further provider
    /// call is made. A second call while one is in flight fails with
    /// [`GenerationError::Busy`] without touching the provider.
    pub async fn submit_and_await<R>(
        &self,
        request: &GenerationRequest,
        reporter: &mut R,
        cancel: &CancellationToken,
    ) -> Result<MediaHandle, GenerationError>
    where
        R: ProgressReporter + ?Sized,
    {
        let _guard = BusyGuard::acquire(&self.busy).ok_or(GenerationError::Busy)?;

        let settings = request.video_settings().ok_or_else(|| {
            GenerationError::InvalidRequest("the job driver only handles video requests".into())
        })?;

        let mut progress = MonotonicReporter::new(reporter);
        progress.emit(ProgressTick::init());

        if cancel.is_cancelled() {
            tracing::info!("Generation cancelled before submission");
            return Err(GenerationError::Cancelled);
        }

        let prompt = compose_prompt(request);
        let mut job = self
            .provider
            .submit_video_job(
                &prompt,
                request.seed_image(),
                settings.resolution,
                settings.aspect_ratio,
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Video job submission failed");
                classify_provider_error(&e)
            })?;

        tracing::info!(
            job = job.name(),
            resolution = %settings.resolution,
            aspect_ratio = %settings.aspect_ratio,
            seeded = request.seed_image().is_some(),
            "Video job accepted",
        );

        let mut poll_count = 0u32;
        while !job.is_done() {
            self.cancelled_at(cancel, job.name())?;

            if let Some(max) = self.config.max_polls {
                if poll_count >= max {
                    tracing::warn!(job = job.name(), poll_count, "Video job exceeded poll limit");
                    return Err(GenerationError::TimedOut { polls: poll_count });
                }
            }

            let tick = poll_tick(poll_count);
            tracing::debug!(
                job = job.name(),
                poll_count,
                percent = tick.percent,
                "Waiting on video job",
            );
            progress.emit(tick);

            self.wait(cancel).await;
            self.cancelled_at(cancel, job.name())?;

            job = self.provider.poll_job(&job).await.map_err(|e| {
                tracing::warn!(job = job.name(), error = %e, "Video job poll failed");
                classify_provider_error(&e)
            })?;
            poll_count += 1;
        }

        self.cancelled_at(cancel, job.name())?;

        let locator = job
            .result_locator()
            .ok_or_else(|| {
                tracing::error!(job = job.name(), "Video job finished without a result");
                GenerationError::GenerationFailed(
                    "Video generation completed but no URI was returned.".into(),
                )
            })?
            .to_string();

        progress.emit(ProgressTick::downloading());

        let bytes = self.provider.fetch_artifact(&locator).await.map_err(|e| {
            tracing::warn!(job = job.name(), error = %e, "Artifact download failed");
            classify_provider_error(&e)
        })?;

        self.cancelled_at(cancel, job.name())?;

        if bytes.is_empty() {
            return Err(GenerationError::GenerationFailed(
                "Downloaded video is empty.".into(),
            ));
        }

        tracing::info!(job = job.name(), poll_count, bytes = bytes.len(), "Video job complete");
        Ok(MediaHandle::video(bytes))
    }

    fn cancelled_at(&self, cancel: &CancellationToken, job: &str) -> Result<(), GenerationError> {
        checkpoint(cancel).inspect_err(|_| {
            tracing::info!(job, "Generation cancelled");
        })
    }

    /// Sleep for the poll interval. Returns early if `cancel` fires; the
    /// caller's post-wait checkpoint turns that into `Cancelled`.
    async fn wait(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.poll_interval) => {}
        }
    }
}
