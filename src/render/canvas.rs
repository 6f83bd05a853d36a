use vello_cpu::kurbo::{Affine, Rect, Shape as _};
use vello_cpu::peniko::Color;

use crate::assets::decode::PreparedImage;
use crate::assets::text::TextRun;
use crate::foundation::core::{Canvas, PixelRect, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;

/// One rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Opaque RGB8 bytes, alpha flattened over black.
    pub fn to_rgb8(&self) -> ReelResult<Vec<u8>> {
        let mut opaque = vec![0u8; self.data.len()];
        if self.premultiplied {
            flatten_premul_over_bg_to_opaque_rgba8(&mut opaque, &self.data, [0, 0, 0, 255])?;
        } else {
            opaque.copy_from_slice(&self.data);
        }
        Ok(opaque
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect())
    }
}

/// Two-layer drawing surface: a raster underlay plus vector shapes and text from `vello_cpu`.
///
/// [`RasterCanvas::fill`] and [`RasterCanvas::draw_image`] write straight into the underlay with
/// integer pixel placement. Rects, ellipses and text are recorded into the render context and
/// composited over the underlay by [`RasterCanvas::finish`], so they always land above images.
/// Buffers are reused across frames.
pub struct RasterCanvas {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    underlay: Vec<u8>,
    width: u16,
    height: u16,
}

impl RasterCanvas {
    pub fn new(canvas: Canvas) -> ReelResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelError::render("canvas height exceeds u16"))?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
            underlay: vec![0u8; usize::from(width) * usize::from(height) * 4],
            width,
            height,
        })
    }

    /// Start a new, fully transparent frame.
    pub fn begin(&mut self) {
        self.ctx.reset();
        self.ctx.set_transform(Affine::IDENTITY);
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.underlay.fill(0);
    }

    /// Replace the underlay with a solid color.
    pub fn fill(&mut self, color: Rgba8) {
        let px = color.premul();
        for d in self.underlay.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Composite `image` unscaled into the underlay with its top-left corner at `(x, y)`.
    pub fn draw_image(&mut self, image: &PreparedImage, x: i64, y: i64) {
        let dst_rect = PixelRect::new(
            0,
            0,
            i64::from(self.width),
            i64::from(self.height),
        )
        .intersect(PixelRect::new(
            x,
            y,
            x + i64::from(image.width),
            y + i64::from(image.height),
        ));
        if dst_rect.is_empty() {
            return;
        }
        let dst_stride = usize::from(self.width) * 4;
        let src_stride = image.width as usize * 4;
        let row_bytes = dst_rect.width() as usize * 4;
        for dy in dst_rect.y0..dst_rect.y1 {
            let sy = (dy - y) as usize;
            let sx = (dst_rect.x0 - x) as usize;
            let d0 = dy as usize * dst_stride + dst_rect.x0 as usize * 4;
            let s0 = sy * src_stride + sx * 4;
            premul_over_row(
                &mut self.underlay[d0..d0 + row_bytes],
                &image.rgba8_premul[s0..s0 + row_bytes],
            );
        }
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba8) {
        if rect.is_empty() {
            return;
        }
        self.ctx.set_paint(to_color(color));
        self.ctx.fill_rect(&to_rect(rect));
    }

    /// Outline drawn inside `rect`, `width` pixels thick.
    pub fn outline_rect(&mut self, rect: PixelRect, color: Rgba8, width: u32) {
        if width == 0 || rect.is_empty() {
            return;
        }
        let w = i64::from(width);
        let PixelRect { x0, y0, x1, y1 } = rect;
        for band in [
            PixelRect::new(x0, y0, x1, (y0 + w).min(y1)),
            PixelRect::new(x0, (y1 - w).max(y0), x1, y1),
            PixelRect::new(x0, y0, (x0 + w).min(x1), y1),
            PixelRect::new((x1 - w).max(x0), y0, x1, y1),
        ] {
            self.fill_rect(band, color);
        }
    }

    /// Ellipse inscribed in `rect`.
    pub fn fill_ellipse(&mut self, rect: PixelRect, color: Rgba8) {
        if rect.is_empty() {
            return;
        }
        let path = vello_cpu::kurbo::Ellipse::from_rect(to_rect(rect)).to_path(0.1);
        self.ctx.set_paint(to_color(color));
        self.ctx.fill_path(&path);
    }

    /// Draw `run` with the top-left of its line box at `(x, y)`; the outline goes under the fill.
    pub fn draw_text(&mut self, run: &TextRun, x: f64, y: f64) {
        self.ctx.set_transform(Affine::translate((x, y)));
        for line in run.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let font_size = glyph_run.run().font_size();
                let glyphs = || {
                    glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                };

                if run.stroke_width > 0 {
                    self.ctx.set_paint(to_color(run.stroke_color));
                    self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(f64::from(
                        2 * run.stroke_width,
                    )));
                    self.ctx
                        .glyph_run(&run.font)
                        .font_size(font_size)
                        .stroke_glyphs(glyphs());
                }

                let brush = glyph_run.style().brush;
                self.ctx
                    .set_paint(Color::from_rgba8(brush.r, brush.g, brush.b, brush.a));
                self.ctx
                    .glyph_run(&run.font)
                    .font_size(font_size)
                    .fill_glyphs(glyphs());
            }
        }
        self.ctx.set_transform(Affine::IDENTITY);
    }

    /// Rasterize the vector layer and composite it over the underlay.
    pub fn finish(&mut self) -> FrameRGBA {
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);

        let mut data = self.underlay.clone();
        premul_over_row(&mut data, self.pixmap.data_as_u8_slice());
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data,
            premultiplied: true,
        }
    }
}

fn to_color(c: Rgba8) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn to_rect(r: PixelRect) -> Rect {
    Rect::new(r.x0 as f64, r.y0 as f64, r.x1 as f64, r.y1 as f64)
}

/// Premultiplied source-over for two equal-length RGBA8 runs.
fn premul_over_row(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - sa;
        for c in 0..4 {
            let v = u16::from(s[c]) + mul_div255_u16(u16::from(d[c]), inv);
            d[c] = v.min(255) as u8;
        }
    }
}

/// Composite premultiplied RGBA8 over an opaque background; the result has alpha 255 everywhere.
pub(crate) fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (s[0] as u16 + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (s[1] as u16 + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (s[2] as u16 + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
