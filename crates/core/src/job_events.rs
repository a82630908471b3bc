//! Event type names for the generation lifecycle.
//!
//! Used by the session when publishing on the event bus and by any
//! subscriber that filters on `event_type`.

/// A generation was accepted and the job is being submitted.
pub const EVT_GENERATION_STARTED: &str = "generation.started";

/// Progress tick (message + percent).
pub const EVT_GENERATION_PROGRESS: &str = "generation.progress";

/// The asset was materialized and stored.
pub const EVT_GENERATION_COMPLETED: &str = "generation.completed";

/// The provider failed or produced no usable artifact.
pub const EVT_GENERATION_FAILED: &str = "generation.failed";

/// The user cancelled the running generation.
pub const EVT_GENERATION_CANCELLED: &str = "generation.cancelled";

/// The provider rejected the credentials; re-authentication is required.
pub const EVT_GENERATION_AUTH_REQUIRED: &str = "generation.auth_required";

/// Analysis text was attached to a stored video.
pub const EVT_ASSET_ANALYZED: &str = "asset.analyzed";
