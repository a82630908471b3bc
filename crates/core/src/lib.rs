//! Domain types for the Lumina generation studio.
//!
//! Pure data and pure functions only: generation settings, prompt
//! composition, the progress schedule, and the persisted asset model.
//! Network, storage and orchestration live in the sibling crates.

pub mod assets;
pub mod error;
pub mod generation;
pub mod job_events;
pub mod media;
pub mod progress;
pub mod prompt;
pub mod types;
