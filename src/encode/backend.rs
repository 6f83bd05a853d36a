use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, concat_videos};
use crate::encode::sink::{AudioInputConfig, FrameSink};
use crate::foundation::error::ReelResult;

/// Media operations the pipeline delegates to an external toolchain.
///
/// Shared between the orchestrator and the track worker thread, hence `Send + Sync`.
pub trait MediaBackend: Send + Sync {
    /// Frame sink writing a 1 fps MP4 to `out_path`; audio is chosen in [`FrameSink::begin`].
    fn open_sink(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>>;

    /// Decode `src` into internal-format raw PCM at `dst`.
    fn transcode_audio(&self, src: &Path, dst: &Path) -> ReelResult<()>;

    /// Join per-track videos in order, with `audio` as the soundtrack when given.
    fn concat_videos(
        &self,
        parts: &[PathBuf],
        audio: Option<&AudioInputConfig>,
        out_path: &Path,
    ) -> ReelResult<()>;
}

/// [`MediaBackend`] backed by the system `ffmpeg` binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegBackend;

impl MediaBackend for FfmpegBackend {
    fn open_sink(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(out_path))))
    }

    fn transcode_audio(&self, src: &Path, dst: &Path) -> ReelResult<()> {
        crate::assets::media::transcode_to_f32le(src, dst)
    }

    fn concat_videos(
        &self,
        parts: &[PathBuf],
        audio: Option<&AudioInputConfig>,
        out_path: &Path,
    ) -> ReelResult<()> {
        concat_videos(parts, audio, out_path)
    }
}
