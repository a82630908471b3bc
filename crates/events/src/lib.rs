//! Lumina generation event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`GenerationEvent`]: the event envelope published for every
//!   generation lifecycle transition.

pub mod bus;

pub use bus::{EventBus, GenerationEvent};
