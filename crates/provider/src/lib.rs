//! Remote generation provider boundary.
//!
//! Defines the [`GenerationProvider`] trait the job driver polls, the
//! opaque [`JobHandle`] it refreshes, and [`GeminiApi`], the REST
//! implementation backed by [`reqwest`].

pub mod api;
pub mod config;
pub mod error;
pub mod messages;
pub mod provider;

pub use api::GeminiApi;
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use provider::{GenerationProvider, JobHandle};
