//! Content-addressed store for fetched audio and rendered per-track video.

pub mod key;
pub mod store;

pub use key::CacheKey;
pub use store::{ArtifactCache, Sidecar};
