//! Generation orchestration.
//!
//! - [`JobDriver`]: drives one long-running video job from submission to
//!   downloaded artifact, with progress and cooperative cancellation.
//! - [`ImageGenerator`]: the single-call image path.
//! - [`GenerationSession`]: the caller-side state machine that gates
//!   submissions, persists results and publishes lifecycle events.
//! - [`VideoAnalyzer`]: post-hoc analysis of a stored video.

pub mod analysis;
pub mod driver;
pub mod error;
pub mod gate;
pub mod image;
pub mod session;

pub use analysis::VideoAnalyzer;
pub use driver::{DriverConfig, JobDriver};
pub use error::{classify_provider_error, GenerationError, SessionError};
pub use gate::CredentialGate;
pub use image::ImageGenerator;
pub use session::{GenerationOutcome, GenerationSession, SessionConfig, SessionState};
