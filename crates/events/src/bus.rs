//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans out [`GenerationEvent`]s to every subscriber. Share it
//! via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use lumina_core::progress::ProgressTick;
use lumina_core::types::AssetId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// GenerationEvent
// ---------------------------------------------------------------------------

/// Something that happened to a generation run.
///
/// Constructed via [`GenerationEvent::new`] and enriched with
/// [`with_user`](GenerationEvent::with_user),
/// [`with_asset`](GenerationEvent::with_asset) and
/// [`with_payload`](GenerationEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationEvent {
    /// Dot-separated event name, e.g. `"generation.progress"`. See
    /// [`lumina_core::job_events`].
    pub event_type: String,

    /// User the run belongs to.
    pub user_id: Option<String>,

    /// Asset produced or touched by the run.
    pub asset_id: Option<AssetId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl GenerationEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            user_id: None,
            asset_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_asset(mut self, asset_id: AssetId) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Payload for a progress tick: `{"message": ..., "percent": ...}`.
    pub fn with_tick(self, tick: &ProgressTick) -> Self {
        self.with_payload(serde_json::json!({
            "message": tick.message,
            "percent": tick.percent,
        }))
    }

    /// The `"message"` payload field, if present.
    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(|m| m.as_str())
    }

    /// The `"percent"` payload field, if present.
    pub fn percent(&self) -> Option<u8> {
        self.payload
            .get("percent")
            .and_then(|p| p.as_u64())
            .and_then(|p| u8::try_from(p).ok())
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use lumina_events::bus::{EventBus, GenerationEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(GenerationEvent::new("generation.started"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<GenerationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Dropped silently when
    /// nobody is subscribed.
    pub fn publish(&self, event: GenerationEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GenerationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
