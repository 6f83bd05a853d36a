//! `song`: framed cover centered over a blurred, canvas-filling copy of itself.

use image::RgbaImage;

use crate::assets::decode::{self, PreparedImage};
use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;
use crate::foundation::math::floor_div;
use crate::render::canvas::{FrameRGBA, RasterCanvas};
use crate::style::StillStyle;
use crate::synth::background::blurred_cover;

/// Top-left of a `size x size` square centered on the canvas.
pub fn centered_origin(canvas: Canvas, size: u32) -> (i64, i64) {
    (
        floor_div(i64::from(canvas.width) - i64::from(size), 2),
        floor_div(i64::from(canvas.height) - i64::from(size), 2),
    )
}

/// Every frame is identical, so it is rasterized once.
pub struct StillScene {
    frame: FrameRGBA,
}

impl StillScene {
    pub fn new(canvas: Canvas, style: &StillStyle, cover: &RgbaImage) -> ReelResult<Self> {
        let bg = blurred_cover(cover, canvas, style.bg.blur_radius)?;
        let framed = PreparedImage::from_straight(decode::framed_cover(
            cover,
            style.image.size,
            style.image.border_width,
            style.image.border_color,
        ));
        let (x, y) = centered_origin(canvas, style.image.framed_size());

        let mut raster = RasterCanvas::new(canvas)?;
        raster.begin();
        raster.draw_image(&bg, 0, 0);
        raster.draw_image(&framed, x, y);
        Ok(Self {
            frame: raster.finish(),
        })
    }

    pub fn render(&self) -> FrameRGBA {
        self.frame.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/synth/still.rs"]
mod tests;
