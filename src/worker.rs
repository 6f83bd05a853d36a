//! Per-track render pipeline and the supervised thread it runs on.
//!
//! A track's work is fetch-or-reuse audio, then (when a video job is configured) fetch-or-reuse
//! its progress-bar video. Both steps consult the [`ArtifactCache`] first, so a rerun after a
//! failure resumes from the first track that never committed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use anyhow::Context as _;

use crate::assets::decode::PreparedImage;
use crate::assets::media::{MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::assets::text::FontBook;
use crate::cache::key::sha256_hex;
use crate::cache::{ArtifactCache, CacheKey};
use crate::encode::backend::MediaBackend;
use crate::encode::sink::{AudioInputConfig, SinkConfig};
use crate::fetch::AudioFetcher;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::frames_to_ms;
use crate::playlist::TrackDescriptor;
use crate::style::TimebarStyle;
use crate::synth::timebar::TimebarScene;

/// Cache extension of decoded track audio.
pub const AUDIO_EXT: &str = "f32le";
/// Cache extension of rendered per-track video.
pub const VIDEO_EXT: &str = "mp4";
/// Final-state frames appended after the last progress frame.
pub const TAIL_FRAMES: u64 = 2;

/// Format tag folded into audio sidecars.
pub fn audio_tag() -> String {
    format!("{AUDIO_EXT}-{MIX_SAMPLE_RATE}-{MIX_CHANNELS}")
}

/// Raw internal-format PCM file as a sink audio input.
pub fn mix_audio_input(path: impl Into<PathBuf>) -> AudioInputConfig {
    AudioInputConfig {
        path: path.into(),
        sample_rate: MIX_SAMPLE_RATE,
        channels: MIX_CHANNELS,
    }
}

/// Cooperative cancellation flag shared between a supervisor and its worker.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has been tripped.
    pub fn check(&self) -> ReelResult<()> {
        if self.is_cancelled() {
            return Err(ReelError::Cancelled);
        }
        Ok(())
    }
}

/// Run `job` on a dedicated thread and wait at most `timeout` for its single result.
///
/// On timeout the token is tripped and [`ReelError::WorkerTimeout`] is returned without waiting
/// further; the worker unwinds at its next cancellation check. A worker that panics is reported
/// as [`ReelError::WorkerCrashed`].
pub fn run_supervised<T, F>(
    name: &str,
    timeout: Duration,
    token: CancelToken,
    job: F,
) -> ReelResult<T>
where
    T: Send + 'static,
    F: FnOnce(CancelToken) -> ReelResult<T> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    let worker_token = token.clone();
    let handle = std::thread::Builder::new()
        .name(format!("track-{name}"))
        .spawn(move || {
            let _ = tx.send(job(worker_token));
        })
        .with_context(|| format!("spawn worker for '{name}'"))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            let _ = handle.join();
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            token.cancel();
            tracing::warn!(worker = name, ?timeout, "worker timed out; cancelling");
            Err(ReelError::WorkerTimeout(timeout))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let reason = match handle.join() {
                Err(payload) => panic_message(payload.as_ref()),
                Ok(()) => "worker exited without a result".to_string(),
            };
            tracing::warn!(worker = name, %reason, "worker crashed");
            Err(ReelError::WorkerCrashed(reason))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// Decode a local audio file into the cache once, keyed by its path.
pub fn cached_local_audio(
    cache: &ArtifactCache,
    backend: &dyn MediaBackend,
    src: &Path,
) -> ReelResult<PathBuf> {
    let key = CacheKey::from_url(&format!("file://{}", src.display()))?;
    let tag = audio_tag();
    if let Some(hit) = cache.lookup(&key, AUDIO_EXT, &tag) {
        return Ok(hit);
    }
    backend.transcode_audio(src, &cache.store_path(&key, AUDIO_EXT))?;
    cache.commit(&key, AUDIO_EXT, &tag)
}

/// Whole seconds of internal-format PCM in `path`, floored.
pub fn pcm_duration_secs(path: &Path) -> ReelResult<u64> {
    Ok(pcm_duration_ms(path)? / 1000)
}

pub fn pcm_duration_ms(path: &Path) -> ReelResult<u64> {
    let bytes = std::fs::metadata(path)
        .with_context(|| format!("stat pcm '{}'", path.display()))?
        .len();
    let frame_bytes = 4 * u64::from(MIX_CHANNELS);
    Ok(frames_to_ms((bytes / frame_bytes) as usize, MIX_SAMPLE_RATE))
}

/// Everything fixed across tracks that the per-track video needs.
#[derive(Clone, Debug)]
pub struct VideoJob {
    pub canvas: Canvas,
    pub style: TimebarStyle,
    pub background: PreparedImage,
    /// Fingerprint of the background source, folded into video tags.
    pub background_sha256: String,
    pub fonts_dir: PathBuf,
}

impl VideoJob {
    /// Cache tag for one track's video: changes whenever anything drawn into it changes.
    pub fn tag(&self, track: &TrackDescriptor, effective_secs: u64) -> ReelResult<String> {
        let doc = serde_json::json!({
            "format": "h264-1fps",
            "canvas": [self.canvas.width, self.canvas.height],
            "style": &self.style,
            "background": &self.background_sha256,
            "title": &track.title,
            "crop": [track.crop_start, track.crop_end],
            "effective_secs": effective_secs,
        });
        let bytes = serde_json::to_vec(&doc)
            .map_err(|e| ReelError::cache(format!("serialize video tag: {e}")))?;
        Ok(sha256_hex(&bytes))
    }
}

/// Cached outputs of one track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackArtifacts {
    pub key: CacheKey,
    /// Internal-format PCM of the whole, uncropped track.
    pub audio: PathBuf,
    /// Silent 1 fps progress video, when a [`VideoJob`] was configured.
    pub video: Option<PathBuf>,
    pub effective_secs: u64,
}

/// Per-track pipeline. Cheap to clone, so a copy can be moved onto the worker thread.
#[derive(Clone)]
pub struct TrackRenderer {
    cache: Arc<ArtifactCache>,
    fetcher: Arc<dyn AudioFetcher>,
    backend: Arc<dyn MediaBackend>,
    video: Option<Arc<VideoJob>>,
}

impl TrackRenderer {
    pub fn new(
        cache: Arc<ArtifactCache>,
        fetcher: Arc<dyn AudioFetcher>,
        backend: Arc<dyn MediaBackend>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            backend,
            video: None,
        }
    }

    pub fn with_video(mut self, job: VideoJob) -> Self {
        self.video = Some(Arc::new(job));
        self
    }

    #[tracing::instrument(skip(self, track, token), fields(title = %track.title))]
    pub fn render_track(
        &self,
        track: &TrackDescriptor,
        token: &CancelToken,
    ) -> ReelResult<TrackArtifacts> {
        let key = CacheKey::from_url(&track.url)?;
        let audio = self.ensure_audio(&key, &track.url, token)?;

        let raw_secs = pcm_duration_secs(&audio)?;
        let effective_secs = track.effective_secs(raw_secs).ok_or_else(|| {
            ReelError::timeline(format!(
                "'{}': crop_start {}s + crop_end {}s leaves nothing of a {raw_secs}s track",
                track.title, track.crop_start, track.crop_end
            ))
        })?;

        let video = match &self.video {
            Some(job) => Some(self.ensure_video(job, &key, track, effective_secs, token)?),
            None => None,
        };

        Ok(TrackArtifacts {
            key,
            audio,
            video,
            effective_secs,
        })
    }

    fn ensure_audio(&self, key: &CacheKey, url: &str, token: &CancelToken) -> ReelResult<PathBuf> {
        let tag = audio_tag();
        if let Some(hit) = self.cache.lookup(key, AUDIO_EXT, &tag) {
            return Ok(hit);
        }
        token.check()?;
        tracing::info!(key = %key, "fetching audio");
        let download = self
            .fetcher
            .fetch_audio(url, self.cache.root(), &key.file_name("download"), token)?;
        token.check()?;
        self.backend
            .transcode_audio(&download, &self.cache.store_path(key, AUDIO_EXT))?;
        let committed = self.cache.commit(key, AUDIO_EXT, &tag)?;
        if let Err(e) = std::fs::remove_file(&download) {
            tracing::warn!(path = %download.display(), error = %e, "could not remove download");
        }
        Ok(committed)
    }

    fn ensure_video(
        &self,
        job: &VideoJob,
        key: &CacheKey,
        track: &TrackDescriptor,
        effective_secs: u64,
        token: &CancelToken,
    ) -> ReelResult<PathBuf> {
        let tag = job.tag(track, effective_secs)?;
        if let Some(hit) = self.cache.lookup(key, VIDEO_EXT, &tag) {
            return Ok(hit);
        }

        tracing::info!(key = %key, effective_secs, "rendering track video");
        let mut scene = TimebarScene::new(
            job.canvas,
            &job.style,
            job.background.clone(),
            &track.title,
            FontBook::new(&job.fonts_dir),
        )?;
        let mut sink = self
            .backend
            .open_sink(&self.cache.store_path(key, VIDEO_EXT))?;
        sink.begin(SinkConfig::silent(job.canvas.width, job.canvas.height))?;

        let states = (0..effective_secs).chain((0..TAIL_FRAMES).map(|_| effective_secs));
        for (idx, elapsed) in states.enumerate() {
            token.check()?;
            let frame = scene.render(elapsed, effective_secs)?;
            sink.push_frame(idx as u64, &frame)?;
        }
        sink.end()?;

        self.cache.commit(key, VIDEO_EXT, &tag)
    }
}

#[cfg(test)]
#[path = "../tests/unit/worker.rs"]
mod tests;
