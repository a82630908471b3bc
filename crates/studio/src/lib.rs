//! Command-line front end for the Lumina generation studio.
//!
//! The binary wires the Gemini provider, file-backed stores and the event
//! bus into a [`GenerationSession`](lumina_pipeline::GenerationSession)
//! and drives one command per invocation.

pub mod cli;
pub mod config;
pub mod gate;
pub mod render;
