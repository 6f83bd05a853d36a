//! playreel renders playlists into still-frame music videos.
//!
//! A run is driven by a [`RunConfig`] and a [`StyleSpec`]:
//!
//! - Load and validate the [`Playlist`]
//! - Fetch or reuse each track's audio (and per-track video) through the [`ArtifactCache`]
//! - Assemble the crossfaded [`AudioTimeline`] and its timecodes
//! - Encode through a [`MediaBackend`] into one MP4 plus `timecodes.txt`
#![forbid(unsafe_code)]

mod foundation;

pub mod assets;
pub mod audio;
pub mod cache;
pub mod config;
pub mod encode;
pub mod fetch;
pub mod orchestrator;
pub mod playlist;
pub mod render;
pub mod style;
pub mod synth;
pub mod worker;

pub use crate::foundation::core::{Canvas, PixelRect, Rgba8, format_mm_ss};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::audio::{AudioBuffer, AudioTimeline, SilencePad, TimecodeEntry};
pub use crate::cache::{ArtifactCache, CacheKey};
pub use crate::config::{CachePolicy, FetchConfig, Paths, RenderMode, RunConfig, TimecodeMode};
pub use crate::encode::{
    AudioInputConfig, FfmpegBackend, FrameSink, InMemorySink, MediaBackend, SinkConfig,
};
pub use crate::fetch::{AudioFetcher, CommandFetcher};
pub use crate::orchestrator::{Orchestrator, RenderOutput};
pub use crate::playlist::{Playlist, TrackDescriptor};
pub use crate::render::FrameRGBA;
pub use crate::style::StyleSpec;
pub use crate::synth::{FrameState, Scene};
pub use crate::worker::{CancelToken, TrackArtifacts, TrackRenderer, run_supervised};
