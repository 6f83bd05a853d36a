use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use image::RgbaImage;
use image::imageops::FilterType;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{ReelError, ReelResult};

/// Resampling filter for every resize (bicubic).
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Raster ready for drawing, in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    pub fn from_straight(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut rgba8_premul = img.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }
    }
}

pub fn load_image(path: &Path) -> ReelResult<RgbaImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
        .map_err(|e| ReelError::render(format!("decode image '{}': {e}", path.display())))
}

pub fn decode_image(bytes: &[u8]) -> ReelResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

/// Resize to exactly `width x height`, ignoring aspect ratio. Same-size input is returned as-is.
pub fn resize_exact(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    image::imageops::resize(img, width, height, RESIZE_FILTER)
}

/// Scale uniformly until `width x height` is covered, then crop the center.
pub fn resize_cover(img: &RgbaImage, width: u32, height: u32) -> ReelResult<RgbaImage> {
    let (iw, ih) = img.dimensions();
    if iw == 0 || ih == 0 {
        return Err(ReelError::render("cannot scale an empty image"));
    }
    let scale = f64::max(
        f64::from(width) / f64::from(iw),
        f64::from(height) / f64::from(ih),
    );
    let sw = ((f64::from(iw) * scale).ceil() as u32).max(width);
    let sh = ((f64::from(ih) * scale).ceil() as u32).max(height);
    let scaled = resize_exact(img, sw, sh);
    let x = (sw - width) / 2;
    let y = (sh - height) / 2;
    Ok(image::imageops::crop_imm(&scaled, x, y, width, height).to_image())
}

/// Add a solid `border` pixels wide on every side.
pub fn expand_border(img: &RgbaImage, border: u32, color: Rgba8) -> RgbaImage {
    if border == 0 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    let mut out = RgbaImage::from_pixel(
        w + 2 * border,
        h + 2 * border,
        image::Rgba([color.r, color.g, color.b, color.a]),
    );
    image::imageops::replace(&mut out, img, i64::from(border), i64::from(border));
    out
}

/// Square cover art: resized to `size` and framed with `border` pixels of `color`.
pub fn framed_cover(img: &RgbaImage, size: u32, border: u32, color: Rgba8) -> RgbaImage {
    expand_border(&resize_exact(img, size, size), border, color)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
