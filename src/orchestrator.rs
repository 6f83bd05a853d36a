//! Drives a whole run: loads inputs, renders tracks in playlist order through the supervised
//! worker, assembles the audio timeline and publishes the outputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use image::RgbaImage;

use crate::assets::decode::{self, PreparedImage};
use crate::assets::media::{MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::assets::text::FontBook;
use crate::audio::pcm::AudioBuffer;
use crate::audio::timeline::{
    AudioTimeline, PAD_SECS_APPROX, SilencePad, TimecodeEntry, write_timecodes,
};
use crate::cache::ArtifactCache;
use crate::cache::key::sha256_hex;
use crate::config::{RenderMode, RunConfig};
use crate::encode::backend::{FfmpegBackend, MediaBackend};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::fetch::{AudioFetcher, CommandFetcher};
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::playlist::{Playlist, TrackDescriptor};
use crate::render::canvas::FrameRGBA;
use crate::style::StyleSpec;
use crate::synth::background::timebar_background;
use crate::synth::{FrameState, Scene, StillScene, TimebarScene, TracklistScene, save_jpeg};
use crate::worker::{
    CancelToken, TrackArtifacts, TrackRenderer, VideoJob, cached_local_audio, mix_audio_input,
    pcm_duration_ms, run_supervised,
};

/// Elapsed/total seconds shown by the `v1` example frame.
pub const EXAMPLE_ELAPSED_SECS: u64 = 13;
pub const EXAMPLE_TOTAL_SECS: u64 = 124;

pub const FRAME_FILE: &str = "frame.jpg";
pub const PLAYLIST_VIDEO_FILE: &str = "playlist.mp4";
pub const PLAYLIST_AUDIO_FILE: &str = "playlist.f32le";
pub const TIMECODES_FILE: &str = "timecodes.txt";
pub const SONG_VIDEO_FILE: &str = "song.mp4";

/// What a run published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderOutput {
    ExampleFrame {
        jpg: PathBuf,
    },
    Playlist {
        video: PathBuf,
        timecodes: PathBuf,
        entries: Vec<TimecodeEntry>,
    },
    Song {
        video: PathBuf,
    },
}

pub struct Orchestrator {
    config: RunConfig,
    style: StyleSpec,
    cache: Arc<ArtifactCache>,
    fetcher: Arc<dyn AudioFetcher>,
    backend: Arc<dyn MediaBackend>,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        style: StyleSpec,
        fetcher: Arc<dyn AudioFetcher>,
        backend: Arc<dyn MediaBackend>,
    ) -> ReelResult<Self> {
        config.validate()?;
        style.validate()?;
        let cache = ArtifactCache::new(&config.paths.cache_dir, config.cache_policy);
        Ok(Self {
            config,
            style,
            cache: Arc::new(cache),
            fetcher,
            backend,
        })
    }

    /// Production wiring: style from `styles_file`, the configured downloader and `ffmpeg`.
    pub fn from_config(config: RunConfig) -> ReelResult<Self> {
        let style = StyleSpec::load(&config.styles_file)?;
        let fetcher = Arc::new(CommandFetcher::new(&config.fetch));
        Self::new(config, style, fetcher, Arc::new(FfmpegBackend))
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    #[tracing::instrument(skip(self), fields(mode = ?self.config.mode))]
    pub fn run(&self) -> ReelResult<RenderOutput> {
        if self.config.example_frame {
            let jpg = self.render_example_frame()?;
            return Ok(RenderOutput::ExampleFrame { jpg });
        }
        self.cache.create_root()?;
        match self.config.mode {
            RenderMode::Timebar => self.run_timebar(),
            RenderMode::Tracklist => self.run_tracklist(),
            RenderMode::Song => self.run_song(),
        }
    }

    /// Render one representative frame to `<save_dir>/frame.jpg` without fetching or encoding.
    #[tracing::instrument(skip(self))]
    pub fn render_example_frame(&self) -> ReelResult<PathBuf> {
        let canvas = self.style.canvas()?;
        let (mut scene, state) = match self.config.mode {
            RenderMode::Timebar => {
                let playlist = self.playlist()?;
                let style = self.style.timebar()?;
                let (background, _) = self.timebar_background(canvas)?;
                let scene = TimebarScene::new(
                    canvas,
                    style,
                    background,
                    &playlist.first().title,
                    self.fonts(),
                )?;
                (
                    Scene::Timebar(scene),
                    FrameState::Progress {
                        elapsed: EXAMPLE_ELAPSED_SECS,
                        total: EXAMPLE_TOTAL_SECS,
                    },
                )
            }
            RenderMode::Tracklist => {
                let playlist = self.playlist()?;
                let scene = self.tracklist_scene(canvas, playlist.titles())?;
                (
                    Scene::Tracklist(scene),
                    FrameState::Tracklist { current: 0 },
                )
            }
            RenderMode::Song => (Scene::Still(self.still_scene(canvas)?), FrameState::Still),
        };

        let frame = scene.render(state)?;
        let path = self.config.save_dir.join(FRAME_FILE);
        save_jpeg(&frame, &path)?;
        tracing::info!(path = %path.display(), scene = scene.kind(), "example frame written");
        Ok(path)
    }

    fn run_timebar(&self) -> ReelResult<RenderOutput> {
        let playlist = self.playlist()?;
        let canvas = self.style.canvas()?;
        let (background, background_sha256) = self.timebar_background(canvas)?;
        let renderer = self.renderer().with_video(VideoJob {
            canvas,
            style: self.style.timebar()?.clone(),
            background,
            background_sha256,
            fonts_dir: self.config.paths.fonts_dir.clone(),
        });

        let mut timeline = AudioTimeline::new(self.silence_pad()?, self.config.timecode_mode);
        let mut parts = Vec::with_capacity(playlist.len());
        for (index, track) in playlist.tracks().iter().enumerate() {
            let art = self.render_track(&renderer, index, track)?;
            append_to_timeline(&mut timeline, &art, track)?;
            let video = art.video.ok_or_else(|| {
                ReelError::render(format!("track '{}' produced no video", track.title))
            })?;
            parts.push(video);
        }

        let (audio, entries) = timeline.finish()?;
        let audio_path = self.write_playlist_audio(&audio)?;
        let video = self.config.save_dir.join(PLAYLIST_VIDEO_FILE);
        let staged = staging_path(&video);
        self.backend
            .concat_videos(&parts, Some(&mix_audio_input(&audio_path)), &staged)?;
        publish(&staged, &video)?;
        self.finish_playlist(video, entries)
    }

    fn run_tracklist(&self) -> ReelResult<RenderOutput> {
        let playlist = self.playlist()?;
        let canvas = self.style.canvas()?;
        // Fail on a bad cover or font before any track is fetched.
        let mut scene = self.tracklist_scene(canvas, playlist.titles())?;
        let renderer = self.renderer();

        let mut timeline = AudioTimeline::new(self.silence_pad()?, self.config.timecode_mode);
        let mut holds = Vec::with_capacity(playlist.len());
        for (index, track) in playlist.tracks().iter().enumerate() {
            let art = self.render_track(&renderer, index, track)?;
            let effective = append_to_timeline(&mut timeline, &art, track)?;
            holds.push(effective + PAD_SECS_APPROX);
        }

        let (audio, entries) = timeline.finish()?;
        let audio_path = self.write_playlist_audio(&audio)?;
        let video = self.config.save_dir.join(PLAYLIST_VIDEO_FILE);
        let staged = staging_path(&video);

        let mut sink = self.backend.open_sink(&staged)?;
        sink.begin(
            SinkConfig::silent(canvas.width, canvas.height).with_audio(mix_audio_input(&audio_path)),
        )?;
        let mut idx = 0u64;
        for (current, hold) in holds.into_iter().enumerate() {
            let frame = scene.render(current)?;
            push_held(sink.as_mut(), &mut idx, &frame, hold)?;
        }
        sink.end()?;
        publish(&staged, &video)?;
        self.finish_playlist(video, entries)
    }

    fn run_song(&self) -> ReelResult<RenderOutput> {
        let canvas = self.style.canvas()?;
        let scene = self.still_scene(canvas)?;
        let mp3 = self
            .config
            .mp3_file
            .as_deref()
            .ok_or_else(|| ReelError::config("'mp3_file' is required for song mode"))?;
        let audio = cached_local_audio(&self.cache, self.backend.as_ref(), mp3)?;
        let frames = pcm_duration_ms(&audio)?.div_ceil(1000);
        if frames == 0 {
            return Err(ReelError::timeline(format!(
                "'{}' decoded to no audio",
                mp3.display()
            )));
        }
        tracing::info!(frames, "rendering song video");

        let video = self.config.save_dir.join(SONG_VIDEO_FILE);
        let staged = staging_path(&video);
        let mut sink = self.backend.open_sink(&staged)?;
        sink.begin(
            SinkConfig::silent(canvas.width, canvas.height).with_audio(mix_audio_input(audio)),
        )?;
        let frame = scene.render();
        let mut idx = 0u64;
        push_held(sink.as_mut(), &mut idx, &frame, frames)?;
        sink.end()?;
        publish(&staged, &video)?;
        Ok(RenderOutput::Song { video })
    }

    fn render_track(
        &self,
        renderer: &TrackRenderer,
        index: usize,
        track: &TrackDescriptor,
    ) -> ReelResult<TrackArtifacts> {
        tracing::info!(index, title = %track.title, url = %track.url, "track start");
        let job_renderer = renderer.clone();
        let job_track = track.clone();
        let art = run_supervised(
            &format!("{index}"),
            self.config.worker_timeout(),
            CancelToken::new(),
            move |token| job_renderer.render_track(&job_track, &token),
        )?;
        tracing::info!(index, key = %art.key, effective_secs = art.effective_secs, "track done");
        Ok(art)
    }

    fn renderer(&self) -> TrackRenderer {
        TrackRenderer::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.backend),
        )
    }

    fn playlist(&self) -> ReelResult<Playlist> {
        let path = self
            .config
            .playlist_file
            .as_deref()
            .ok_or_else(|| ReelError::config("'playlist_file' is required"))?;
        Playlist::load(path)
    }

    fn fonts(&self) -> FontBook {
        FontBook::new(&self.config.paths.fonts_dir)
    }

    fn timebar_background(&self, canvas: Canvas) -> ReelResult<(PreparedImage, String)> {
        let path = required(self.config.bg_file.as_deref(), "bg_file")?;
        let bytes = read_input(path)?;
        let bg = decode::decode_image(&bytes)?;
        let prepared = timebar_background(&bg, canvas, self.style.timebar()?)?;
        Ok((prepared, sha256_hex(&bytes)))
    }

    fn tracklist_scene(&self, canvas: Canvas, titles: Vec<String>) -> ReelResult<TracklistScene> {
        let style = self.style.tracklist()?;
        let cover = self.cover()?;
        let bg: Option<RgbaImage> = match self.config.bg_file.as_deref() {
            Some(path) => Some(decode::load_image(path)?),
            None => None,
        };
        TracklistScene::new(canvas, style, bg.as_ref(), &cover, titles, self.fonts())
    }

    fn still_scene(&self, canvas: Canvas) -> ReelResult<StillScene> {
        StillScene::new(canvas, self.style.still()?, &self.cover()?)
    }

    fn cover(&self) -> ReelResult<RgbaImage> {
        decode::load_image(required(self.config.img_file.as_deref(), "img_file")?)
    }

    fn silence_pad(&self) -> ReelResult<SilencePad> {
        match self.config.paths.silence_file.as_deref() {
            Some(src) => {
                let pcm = cached_local_audio(&self.cache, self.backend.as_ref(), src)?;
                SilencePad::from_source(&AudioBuffer::read_f32le(
                    &pcm,
                    MIX_SAMPLE_RATE,
                    MIX_CHANNELS,
                )?)
            }
            None => SilencePad::digital(MIX_SAMPLE_RATE, MIX_CHANNELS),
        }
    }

    fn write_playlist_audio(&self, audio: &AudioBuffer) -> ReelResult<PathBuf> {
        let path = self.cache.root().join(PLAYLIST_AUDIO_FILE);
        audio.write_f32le(&path)?;
        tracing::debug!(path = %path.display(), ms = audio.duration_ms(), "playlist audio written");
        Ok(path)
    }

    fn finish_playlist(
        &self,
        video: PathBuf,
        entries: Vec<TimecodeEntry>,
    ) -> ReelResult<RenderOutput> {
        let timecodes = self.config.save_dir.join(TIMECODES_FILE);
        write_timecodes(&timecodes, &entries)?;
        tracing::info!(
            video = %video.display(),
            tracks = entries.len(),
            "playlist published"
        );
        Ok(RenderOutput::Playlist {
            video,
            timecodes,
            entries,
        })
    }
}

fn append_to_timeline(
    timeline: &mut AudioTimeline,
    art: &TrackArtifacts,
    track: &TrackDescriptor,
) -> ReelResult<u64> {
    let raw = AudioBuffer::read_f32le(&art.audio, MIX_SAMPLE_RATE, MIX_CHANNELS)?;
    let effective = timeline.append_track(&raw, track.crop_start, track.crop_end)?;
    timeline.record_timecode(&track.title, &track.url)?;
    Ok(effective)
}

fn push_held(
    sink: &mut dyn FrameSink,
    idx: &mut u64,
    frame: &FrameRGBA,
    count: u64,
) -> ReelResult<()> {
    for _ in 0..count {
        sink.push_frame(*idx, frame)?;
        *idx += 1;
    }
    Ok(())
}

fn required<'a>(path: Option<&'a Path>, what: &str) -> ReelResult<&'a Path> {
    path.ok_or_else(|| ReelError::config(format!("'{what}' is required")))
}

fn read_input(path: &Path) -> ReelResult<Vec<u8>> {
    Ok(std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn publish(staged: &Path, path: &Path) -> ReelResult<()> {
    std::fs::rename(staged, path).with_context(|| {
        format!("publish '{}' -> '{}'", staged.display(), path.display())
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/orchestrator.rs"]
mod tests;
