//! `v1`: blurred-frame background, track title, and a per-second progress bar with time labels.
//!
//! All layout math is integer floor division on the style numbers, so a given
//! `(style, elapsed, total)` always lands on the same pixels.

use crate::assets::decode::PreparedImage;
use crate::assets::text::{FontBook, TextRun};
use crate::foundation::core::{Canvas, PixelRect, Rgba8, format_mm_ss};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::floor_div;
use crate::render::canvas::{FrameRGBA, RasterCanvas};
use crate::style::{BorderBand, MainRect, TimebarGeometry, TimebarStyle};

/// Main rectangle: horizontally centered, `margin_bottom` above the bottom edge.
pub fn main_rect(canvas: Canvas, rect: &MainRect) -> PixelRect {
    let (w, h) = (i64::from(canvas.width), i64::from(canvas.height));
    let (rw, rh) = (i64::from(rect.width), i64::from(rect.height));
    let x0 = floor_div(w - rw, 2);
    let y1 = h - i64::from(rect.margin_bottom);
    PixelRect::new(x0, y1 - rh, x0 + rw, y1)
}

/// Left, upper, right and lower frame bands, in that order.
pub fn border_bands(canvas: Canvas, band: BorderBand) -> [PixelRect; 4] {
    let (w, h) = (i64::from(canvas.width), i64::from(canvas.height));
    let (m, bw) = (i64::from(band.margin), i64::from(band.width));
    [
        PixelRect::new(m, m, m + bw, h - m),
        PixelRect::new(m, m, w - m, m + bw),
        PixelRect::new(w - m - bw, m, w - m, h - m),
        PixelRect::new(m, h - m - bw, w - m, h - m),
    ]
}

/// Progress bar: centered in `main`, `margin_bottom` above its bottom edge.
pub fn bar_rect(main: PixelRect, geom: &TimebarGeometry) -> PixelRect {
    let (tw, th) = (i64::from(geom.width), i64::from(geom.height));
    let x0 = main.x0 + floor_div(main.width() - tw, 2);
    let y1 = main.y1 - i64::from(geom.margin_bottom);
    PixelRect::new(x0, y1 - th, x0 + tw, y1)
}

/// `floor(bar_width * elapsed / total)`; `total == 0` is fully filled and `elapsed` clamps to
/// `total`.
pub fn filled_width(bar_width: i64, elapsed: u64, total: u64) -> i64 {
    if total == 0 {
        return bar_width;
    }
    let elapsed = elapsed.min(total);
    (i128::from(bar_width) * i128::from(elapsed) / i128::from(total)) as i64
}

/// Knob centered horizontally on the fill boundary, vertically on the bar.
pub fn knob_rect(bar: PixelRect, filled: i64, circle_size: u32) -> PixelRect {
    let half = i64::from(circle_size) / 2;
    let cx = bar.x0 + filled;
    let cy = bar.y0 + bar.height() / 2;
    PixelRect::new(cx - half, cy - half, cx + half, cy + half)
}

/// Prepared `v1` scene for one track.
pub struct TimebarScene {
    style: TimebarStyle,
    background: PreparedImage,
    main: PixelRect,
    bar: PixelRect,
    title: Option<(TextRun, f64, f64)>,
    fonts: FontBook,
    raster: RasterCanvas,
}

impl TimebarScene {
    /// `background` comes from [`crate::synth::background::timebar_background`] and is shared
    /// across tracks; the title is laid out once here.
    pub fn new(
        canvas: Canvas,
        style: &TimebarStyle,
        background: PreparedImage,
        title: &str,
        mut fonts: FontBook,
    ) -> ReelResult<Self> {
        if (background.width, background.height) != (canvas.width, canvas.height) {
            return Err(ReelError::render(format!(
                "timebar background is {}x{}, canvas is {}x{}",
                background.width, background.height, canvas.width, canvas.height
            )));
        }
        let main = main_rect(canvas, &style.main_rect);
        let bar = bar_rect(main, &style.timebar);

        let title = match &style.title {
            Some(ts) => {
                let run = fonts.layout(title, &ts.text)?;
                let x = main.x0 as f64 + ((main.width() as f64 - f64::from(run.width())) / 2.0).floor();
                let y = (main.y0 + i64::from(ts.margin_top)) as f64;
                Some((run, x, y))
            }
            None => None,
        };

        Ok(Self {
            style: style.clone(),
            background,
            main,
            bar,
            title,
            fonts,
            raster: RasterCanvas::new(canvas)?,
        })
    }

    pub fn main_rect(&self) -> PixelRect {
        self.main
    }

    pub fn bar_rect(&self) -> PixelRect {
        self.bar
    }

    pub fn render(&mut self, elapsed: u64, total: u64) -> ReelResult<FrameRGBA> {
        let geom = &self.style.timebar;
        let bar = self.bar;
        let filled = filled_width(bar.width(), elapsed, total);

        self.raster.begin();
        self.raster.draw_image(&self.background, 0, 0);
        if let Some((run, x, y)) = &self.title {
            self.raster.draw_text(run, *x, *y);
        }

        let filled_rect = PixelRect::new(bar.x0, bar.y0, bar.x0 + filled, bar.y1);
        let unfilled_rect = PixelRect::new(bar.x0 + filled, bar.y0, bar.x1, bar.y1);
        for (rect, color) in [
            (filled_rect, geom.color_filled),
            (unfilled_rect, geom.color_empty),
        ] {
            self.raster.fill_rect(rect, color);
            self.raster
                .outline_rect(rect, geom.border_color, geom.border_width);
        }

        let knob = knob_rect(bar, filled, geom.circle_size);
        fill_ringed_ellipse(
            &mut self.raster,
            knob,
            geom.color_filled,
            geom.border_color,
            geom.border_width,
        );

        if let Some(time) = &self.style.time {
            let shown = if total == 0 { 0 } else { elapsed.min(total) };
            let left = self.fonts.layout(&format_mm_ss(shown), &time.text)?;
            let right = self.fonts.layout(&format_mm_ss(total), &time.text)?;
            let y = (bar.y0 - i64::from(time.shift_y)) as f64;
            let left_x = bar.x0 as f64 - f64::from(left.width()) - f64::from(time.shift_x);
            let right_x = (bar.x1 + i64::from(time.shift_x)) as f64;
            self.raster.draw_text(&left, left_x, y);
            self.raster.draw_text(&right, right_x, y);
        }

        Ok(self.raster.finish())
    }
}

/// Ellipse in `fill` with a `ring`-colored outline `ring_width` pixels thick, drawn inside `rect`.
fn fill_ringed_ellipse(
    raster: &mut RasterCanvas,
    rect: PixelRect,
    fill: Rgba8,
    ring: Rgba8,
    ring_width: u32,
) {
    if ring_width == 0 {
        raster.fill_ellipse(rect, fill);
        return;
    }
    let w = i64::from(ring_width);
    raster.fill_ellipse(rect, ring);
    raster.fill_ellipse(
        PixelRect::new(rect.x0 + w, rect.y0 + w, rect.x1 - w, rect.y1 - w),
        fill,
    );
}

#[cfg(test)]
#[path = "../../tests/unit/synth/timebar.rs"]
mod tests;
