//! In-process fakes for the fetch and media collaborators.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use playreel::assets::media::{MIX_CHANNELS, MIX_SAMPLE_RATE};
use playreel::{
    AudioBuffer, AudioFetcher, AudioInputConfig, CancelToken, FrameRGBA, FrameSink, MediaBackend,
    ReelError, ReelResult, SinkConfig,
};

pub fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("playreel_{name}_{}_{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Writes the configured duration (whole seconds) as text; the fake backend decodes it.
#[derive(Default)]
pub struct FakeFetcher {
    pub durations: HashMap<String, u64>,
    pub calls: AtomicUsize,
    pub panic_on: Option<String>,
}

impl FakeFetcher {
    pub fn new(durations: &[(&str, u64)]) -> Self {
        Self {
            durations: durations
                .iter()
                .map(|(u, s)| (u.to_string(), *s))
                .collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AudioFetcher for FakeFetcher {
    fn fetch_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        filename: &str,
        cancel: &CancelToken,
    ) -> ReelResult<PathBuf> {
        cancel.check()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on.as_deref() == Some(url) {
            panic!("downloader crashed on {url}");
        }
        let secs = self
            .durations
            .get(url)
            .ok_or_else(|| ReelError::fetch(format!("no such video: {url}")))?;
        let out = dest_dir.join(filename);
        std::fs::write(&out, secs.to_string()).unwrap();
        Ok(out)
    }
}

/// One finished encode.
#[derive(Clone, Debug)]
pub struct EncodeRecord {
    pub out: PathBuf,
    pub cfg: SinkConfig,
    pub frames: Vec<FrameRGBA>,
}

#[derive(Clone, Debug)]
pub struct ConcatRecord {
    pub parts: Vec<PathBuf>,
    pub audio: Option<AudioInputConfig>,
    pub out: PathBuf,
}

#[derive(Default)]
pub struct FakeBackend {
    pub transcodes: AtomicUsize,
    pub encodes: std::sync::Arc<Mutex<Vec<EncodeRecord>>>,
    pub concats: Mutex<Vec<ConcatRecord>>,
}

impl FakeBackend {
    pub fn transcodes(&self) -> usize {
        self.transcodes.load(Ordering::SeqCst)
    }

    pub fn encodes(&self) -> Vec<EncodeRecord> {
        self.encodes.lock().unwrap().clone()
    }

    pub fn concats(&self) -> Vec<ConcatRecord> {
        self.concats.lock().unwrap().clone()
    }
}

impl MediaBackend for FakeBackend {
    fn open_sink(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>> {
        Ok(Box::new(FileSink {
            out: out_path.to_path_buf(),
            cfg: None,
            frames: Vec::new(),
            log: std::sync::Arc::clone(&self.encodes),
        }))
    }

    /// Source text holds whole seconds; output is that much internal-format silence.
    fn transcode_audio(&self, src: &Path, dst: &Path) -> ReelResult<()> {
        self.transcodes.fetch_add(1, Ordering::SeqCst);
        let text = std::fs::read_to_string(src).unwrap();
        let secs: u64 = text.trim().parse().unwrap();
        AudioBuffer::silence(MIX_SAMPLE_RATE, MIX_CHANNELS, secs * 1000)?.write_f32le(dst)
    }

    fn concat_videos(
        &self,
        parts: &[PathBuf],
        audio: Option<&AudioInputConfig>,
        out_path: &Path,
    ) -> ReelResult<()> {
        let listing: Vec<String> = parts.iter().map(|p| p.display().to_string()).collect();
        std::fs::write(out_path, listing.join("\n")).unwrap();
        self.concats.lock().unwrap().push(ConcatRecord {
            parts: parts.to_vec(),
            audio: audio.cloned(),
            out: out_path.to_path_buf(),
        });
        Ok(())
    }
}

/// Keeps frames in memory and writes a small marker file on `end`.
struct FileSink {
    out: PathBuf,
    cfg: Option<SinkConfig>,
    frames: Vec<FrameRGBA>,
    log: std::sync::Arc<Mutex<Vec<EncodeRecord>>>,
}

impl FrameSink for FileSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> ReelResult<()> {
        assert_eq!(idx as usize, self.frames.len(), "frame indices must be dense");
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        std::fs::write(&self.out, format!("frames={}", self.frames.len())).unwrap();
        self.log.lock().unwrap().push(EncodeRecord {
            out: self.out.clone(),
            cfg: self.cfg.clone().unwrap(),
            frames: std::mem::take(&mut self.frames),
        });
        Ok(())
    }
}

/// 64x48 canvas with every variant and no text except the tracklist rows.
pub fn style_json() -> serde_json::Value {
    serde_json::json!({
        "width": 64,
        "height": 48,
        "v1": {
            "blur_radius": 1.0,
            "main_border": {"margin": 2, "width": 2},
            "main_rect": {"width": 40, "height": 16, "margin_bottom": 4},
            "timebar": {
                "width": 32, "height": 4, "margin_bottom": 4,
                "color_filled": "#ffffff", "color_empty": "#404040",
                "border_color": "#000000", "border_width": 0, "circle_size": 4
            }
        },
        "v2": {
            "bg_color": "#102030",
            "image": {"size": 16, "border_color": "#ffffff", "border_width": 1},
            "tracklist": {
                "x": 24, "y": 4, "font_name": "DejaVuSans.ttf", "font_size": 6.0,
                "color_default": "#c0c0c0", "color_current": "#ffff00", "line_height": 8
            }
        },
        "song": {
            "image": {"size": 20, "border_color": "#ffffff", "border_width": 2},
            "bg": {"blur_radius": 2.0}
        }
    })
}

pub fn write_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
    image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))
        .save(path)
        .unwrap();
}

/// Copy a system font into `fonts_dir`, or `None` when the machine has none to offer.
pub fn install_test_font(fonts_dir: &Path) -> Option<()> {
    let src = Path::new("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
    if !src.is_file() {
        return None;
    }
    std::fs::create_dir_all(fonts_dir).unwrap();
    std::fs::copy(src, fonts_dir.join("DejaVuSans.ttf")).unwrap();
    Some(())
}
