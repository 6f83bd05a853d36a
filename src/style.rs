//! Declarative style document consumed read-only by the frame synthesizer.
//!
//! The document is grouped by visual variant (`v1` timebar, `v2` tracklist, `song` still) and by
//! element inside each variant. Every layout position is derived from these numbers.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub v1: Option<TimebarStyle>,
    #[serde(default)]
    pub v2: Option<TracklistStyle>,
    #[serde(default)]
    pub song: Option<StillStyle>,
}

/// Font, fill and outline of one text element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// File name under the configured fonts directory.
    pub font_name: String,
    pub font_size: f32,
    pub color: Rgba8,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: Rgba8,
    #[serde(default)]
    pub stroke_width: u32,
}

fn default_stroke_color() -> Rgba8 {
    Rgba8::BLACK
}

/// Playlist variant with a per-second progress bar (`v1`).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimebarStyle {
    pub blur_radius: f32,
    pub main_border: BorderBand,
    pub main_rect: MainRect,
    #[serde(default)]
    pub title: Option<TitleStyle>,
    pub timebar: TimebarGeometry,
    #[serde(default)]
    pub time: Option<TimeLabelStyle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BorderBand {
    pub margin: u32,
    pub width: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MainRect {
    pub width: u32,
    pub height: u32,
    pub margin_bottom: u32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TitleStyle {
    #[serde(flatten)]
    pub text: TextStyle,
    #[serde(default = "default_title_margin_top")]
    pub margin_top: u32,
}

fn default_title_margin_top() -> u32 {
    10
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimebarGeometry {
    pub width: u32,
    pub height: u32,
    pub margin_bottom: u32,
    pub color_filled: Rgba8,
    pub color_empty: Rgba8,
    pub border_color: Rgba8,
    #[serde(default)]
    pub border_width: u32,
    pub circle_size: u32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeLabelStyle {
    #[serde(flatten)]
    pub text: TextStyle,
    pub shift_x: i32,
    pub shift_y: i32,
}

/// Playlist variant listing every title with the current one highlighted (`v2`).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracklistStyle {
    pub bg_color: Rgba8,
    pub image: FramedImageStyle,
    pub tracklist: TracklistText,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FramedImageStyle {
    pub size: u32,
    pub border_color: Rgba8,
    #[serde(default)]
    pub border_width: u32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracklistText {
    pub x: i32,
    pub y: i32,
    pub font_name: String,
    pub font_size: f32,
    pub color_default: Rgba8,
    pub color_current: Rgba8,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: Rgba8,
    #[serde(default)]
    pub stroke_width: u32,
    pub line_height: u32,
}

impl TracklistText {
    pub(crate) fn text_style(&self, current: bool) -> TextStyle {
        TextStyle {
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            color: if current {
                self.color_current
            } else {
                self.color_default
            },
            stroke_color: self.stroke_color,
            stroke_width: self.stroke_width,
        }
    }
}

/// Single-song variant: framed cover over a blurred copy of itself.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StillStyle {
    pub image: FramedImageStyle,
    pub bg: StillBackground,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StillBackground {
    pub blur_radius: f32,
}

impl StyleSpec {
    pub fn load(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read style file '{}'", path.display()))?;
        let spec: StyleSpec = serde_json::from_slice(&bytes).map_err(|e| {
            ReelError::config(format!("parse style file '{}': {e}", path.display()))
        })?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn canvas(&self) -> ReelResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Check every present variant against the canvas.
    pub fn validate(&self) -> ReelResult<()> {
        let canvas = self.canvas()?;
        if let Some(v1) = &self.v1 {
            v1.validate(canvas)?;
        }
        if let Some(v2) = &self.v2 {
            v2.validate(canvas)?;
        }
        if let Some(song) = &self.song {
            song.validate(canvas)?;
        }
        Ok(())
    }

    pub fn timebar(&self) -> ReelResult<&TimebarStyle> {
        self.v1
            .as_ref()
            .ok_or_else(|| ReelError::config("style has no 'v1' section"))
    }

    pub fn tracklist(&self) -> ReelResult<&TracklistStyle> {
        self.v2
            .as_ref()
            .ok_or_else(|| ReelError::config("style has no 'v2' section"))
    }

    pub fn still(&self) -> ReelResult<&StillStyle> {
        self.song
            .as_ref()
            .ok_or_else(|| ReelError::config("style has no 'song' section"))
    }
}

impl TextStyle {
    pub(crate) fn validate(&self, what: &str) -> ReelResult<()> {
        if self.font_name.trim().is_empty() {
            return Err(ReelError::config(format!("{what}.font_name must be non-empty")));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ReelError::config(format!("{what}.font_size must be > 0")));
        }
        Ok(())
    }
}

impl TimebarStyle {
    fn validate(&self, canvas: Canvas) -> ReelResult<()> {
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(ReelError::config("v1.blur_radius must be >= 0"));
        }
        if self.main_rect.width > canvas.width || self.main_rect.height > canvas.height {
            return Err(ReelError::config("v1.main_rect must fit inside the canvas"));
        }
        if self.main_rect.height + self.main_rect.margin_bottom > canvas.height {
            return Err(ReelError::config(
                "v1.main_rect height + margin_bottom exceeds canvas height",
            ));
        }
        let band = self.main_border;
        if 2 * (band.margin + band.width) > canvas.width.min(canvas.height) {
            return Err(ReelError::config("v1.main_border does not fit the canvas"));
        }
        if self.timebar.width == 0 || self.timebar.height == 0 {
            return Err(ReelError::config("v1.timebar width/height must be non-zero"));
        }
        if let Some(title) = &self.title {
            title.text.validate("v1.title")?;
        }
        if let Some(time) = &self.time {
            time.text.validate("v1.time")?;
        }
        Ok(())
    }
}

impl TracklistStyle {
    fn validate(&self, canvas: Canvas) -> ReelResult<()> {
        self.image.validate("v2.image", canvas)?;
        self.tracklist.text_style(false).validate("v2.tracklist")?;
        if self.tracklist.line_height == 0 {
            return Err(ReelError::config("v2.tracklist.line_height must be > 0"));
        }
        Ok(())
    }
}

impl StillStyle {
    fn validate(&self, canvas: Canvas) -> ReelResult<()> {
        self.image.validate("song.image", canvas)?;
        if !self.bg.blur_radius.is_finite() || self.bg.blur_radius < 0.0 {
            return Err(ReelError::config("song.bg.blur_radius must be >= 0"));
        }
        Ok(())
    }
}

impl FramedImageStyle {
    /// Edge length including the border on both sides.
    pub fn framed_size(&self) -> u32 {
        self.size + 2 * self.border_width
    }

    fn validate(&self, what: &str, canvas: Canvas) -> ReelResult<()> {
        if self.size == 0 {
            return Err(ReelError::config(format!("{what}.size must be > 0")));
        }
        if self.framed_size() > canvas.width.min(canvas.height) {
            return Err(ReelError::config(format!(
                "{what} (size + border) must fit inside the canvas"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/style.rs"]
mod tests;
