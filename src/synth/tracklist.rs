//! `v2`: framed cover on the left, numbered titles with the current row highlighted.

use image::RgbaImage;

use crate::assets::decode::{self, PreparedImage};
use crate::assets::text::FontBook;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::floor_div;
use crate::render::canvas::{FrameRGBA, RasterCanvas};
use crate::style::TracklistStyle;
use crate::synth::background::solid_or_image;

/// Cover offset: equal margins from the top and left, derived from the canvas height.
pub fn cover_origin(canvas: Canvas, framed_size: u32) -> (i64, i64) {
    let m = floor_div(i64::from(canvas.height) - i64::from(framed_size), 2);
    (m, m)
}

/// Text origin of row `index` (zero-based).
pub fn row_origin(style: &TracklistStyle, index: usize) -> (i64, i64) {
    let t = &style.tracklist;
    (
        i64::from(t.x),
        i64::from(t.y) + index as i64 * i64::from(t.line_height),
    )
}

/// `"{n}. {title}"` with one-based numbering.
pub fn row_label(index: usize, title: &str) -> String {
    format!("{}. {title}", index + 1)
}

pub struct TracklistScene {
    style: TracklistStyle,
    base: PreparedImage,
    titles: Vec<String>,
    fonts: FontBook,
    raster: RasterCanvas,
}

impl TracklistScene {
    pub fn new(
        canvas: Canvas,
        style: &TracklistStyle,
        background: Option<&RgbaImage>,
        cover: &RgbaImage,
        titles: Vec<String>,
        fonts: FontBook,
    ) -> ReelResult<Self> {
        if titles.is_empty() {
            return Err(ReelError::render("tracklist scene needs at least one title"));
        }
        let mut raster = RasterCanvas::new(canvas)?;

        let bg = solid_or_image(background, style.bg_color, canvas);
        let framed = PreparedImage::from_straight(decode::framed_cover(
            cover,
            style.image.size,
            style.image.border_width,
            style.image.border_color,
        ));
        let (x, y) = cover_origin(canvas, style.image.framed_size());

        raster.begin();
        raster.draw_image(&bg, 0, 0);
        raster.draw_image(&framed, x, y);
        let composed = raster.finish();

        Ok(Self {
            style: style.clone(),
            base: PreparedImage {
                width: composed.width,
                height: composed.height,
                rgba8_premul: std::sync::Arc::new(composed.data),
            },
            titles,
            fonts,
            raster,
        })
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Frame with row `current` highlighted.
    pub fn render(&mut self, current: usize) -> ReelResult<FrameRGBA> {
        if current >= self.titles.len() {
            return Err(ReelError::render(format!(
                "current row {current} out of range for {} titles",
                self.titles.len()
            )));
        }

        self.raster.begin();
        self.raster.draw_image(&self.base, 0, 0);
        for (i, title) in self.titles.iter().enumerate() {
            let style = self.style.tracklist.text_style(i == current);
            let run = self.fonts.layout(&row_label(i, title), &style)?;
            let (x, y) = row_origin(&self.style, i);
            self.raster.draw_text(&run, x as f64, y as f64);
        }
        Ok(self.raster.finish())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/synth/tracklist.rs"]
mod tests;
