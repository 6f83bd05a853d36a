//! Encoding boundary: the [`FrameSink`] contract, the `ffmpeg` implementation and the
//! [`MediaBackend`] seam the pipeline talks to.

pub mod backend;
pub mod ffmpeg;
pub mod sink;

pub use backend::{FfmpegBackend, MediaBackend};
pub use ffmpeg::{ChildGuard, FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
