//! Terminal rendering of generation events.

use lumina_core::job_events::{
    EVT_ASSET_ANALYZED, EVT_GENERATION_AUTH_REQUIRED, EVT_GENERATION_CANCELLED,
    EVT_GENERATION_COMPLETED, EVT_GENERATION_FAILED, EVT_GENERATION_PROGRESS,
    EVT_GENERATION_STARTED,
};
use lumina_core::progress::{CANCELLED_MESSAGE, GENERIC_ERROR_MESSAGE};
use lumina_events::GenerationEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{JoinError, JoinHandle};

pub const AUTH_REQUIRED_MESSAGE: &str =
    "The API key was rejected. Select a valid key and try again.";

/// One line of terminal output for `event`, or `None` for events the
/// terminal does not show.
pub fn render_event(event: &GenerationEvent) -> Option<String> {
    let field = |name: &str| event.payload.get(name).and_then(|v| v.as_str());

    match event.event_type.as_str() {
        EVT_GENERATION_STARTED => Some(format!(
            "Starting {} generation: {}",
            field("kind").unwrap_or("asset"),
            field("prompt").unwrap_or_default()
        )),
        EVT_GENERATION_PROGRESS => Some(format!(
            "[{:>3}%] {}",
            event.percent()?,
            event.message().unwrap_or_default()
        )),
        EVT_GENERATION_COMPLETED => Some(format!(
            "Stored {} {} at {}",
            field("kind").unwrap_or("asset"),
            event.asset_id?,
            field("url").unwrap_or_default()
        )),
        EVT_GENERATION_FAILED => Some(format!(
            "Failed: {}",
            event.message().unwrap_or(GENERIC_ERROR_MESSAGE)
        )),
        EVT_GENERATION_CANCELLED => Some(CANCELLED_MESSAGE.to_string()),
        EVT_GENERATION_AUTH_REQUIRED => Some(AUTH_REQUIRED_MESSAGE.to_string()),
        EVT_ASSET_ANALYZED => Some(format!("Analysis attached to {}", event.asset_id?)),
        _ => None,
    }
}

/// Render events from `rx` until `run` finishes, then drain whatever the
/// run published before returning its result.
pub async fn follow<T>(
    rx: &mut broadcast::Receiver<GenerationEvent>,
    mut run: JoinHandle<T>,
    mut sink: impl FnMut(String),
) -> Result<T, JoinError> {
    loop {
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Ok(event) => {
                    if let Some(line) = render_event(&event) {
                        sink(line);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event renderer lagged");
                }
                Err(RecvError::Closed) => return run.await,
            },
            result = &mut run => {
                while let Ok(event) = rx.try_recv() {
                    if let Some(line) = render_event(&event) {
                        sink(line);
                    }
                }
                return result;
            }
        }
    }
}
