//! Persistence collaborators for generated assets.
//!
//! - [`AssetStore`]: per-user, most-recent-first asset history.
//! - [`MediaStore`]: artifact bytes, addressed by the URL stored on the asset.

pub mod assets;
pub mod error;
pub mod media;

pub use assets::{AssetStore, InMemoryAssetStore, JsonFileAssetStore};
pub use error::StoreError;
pub use media::{InMemoryMediaStore, LocalMediaStore, MediaStore};
