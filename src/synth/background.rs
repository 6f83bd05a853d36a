//! Static per-run backgrounds, composed once and reused for every frame.

use image::RgbaImage;

use crate::assets::decode::{self, PreparedImage};
use crate::foundation::core::{Canvas, PixelRect, Rgba8};
use crate::foundation::error::ReelResult;
use crate::render::blur::{blur_regions_rgba8_premul, gaussian_blur_rgba8_premul};
use crate::style::{BorderBand, TimebarStyle};
use crate::synth::timebar::{border_bands, main_rect};

/// Background image with its border bands and main rectangle swapped for a blurred copy.
pub fn timebar_background(
    bg: &RgbaImage,
    canvas: Canvas,
    style: &TimebarStyle,
) -> ReelResult<PreparedImage> {
    let sharp = PreparedImage::from_straight(decode::resize_exact(bg, canvas.width, canvas.height));
    let regions = blurred_regions(canvas, style.main_border, main_rect(canvas, &style.main_rect));
    let out = blur_regions_rgba8_premul(
        &sharp.rgba8_premul,
        canvas.width,
        canvas.height,
        &regions,
        style.blur_radius,
    )?;

    Ok(PreparedImage {
        width: canvas.width,
        height: canvas.height,
        rgba8_premul: std::sync::Arc::new(out),
    })
}

fn blurred_regions(canvas: Canvas, band: BorderBand, main: PixelRect) -> [PixelRect; 5] {
    let [left, upper, right, lower] = border_bands(canvas, band);
    [left, upper, right, lower, main]
}

/// Solid fill, or the given image stretched to the canvas.
pub fn solid_or_image(
    image: Option<&RgbaImage>,
    color: Rgba8,
    canvas: Canvas,
) -> PreparedImage {
    let img = match image {
        Some(img) => decode::resize_exact(img, canvas.width, canvas.height),
        None => RgbaImage::from_pixel(
            canvas.width,
            canvas.height,
            image::Rgba([color.r, color.g, color.b, color.a]),
        ),
    };
    PreparedImage::from_straight(img)
}

/// `cover` scaled to fill the canvas, center-cropped and blurred.
pub fn blurred_cover(cover: &RgbaImage, canvas: Canvas, sigma: f32) -> ReelResult<PreparedImage> {
    let filled = PreparedImage::from_straight(decode::resize_cover(
        cover,
        canvas.width,
        canvas.height,
    )?);
    let blurred =
        gaussian_blur_rgba8_premul(&filled.rgba8_premul, canvas.width, canvas.height, sigma)?;
    Ok(PreparedImage {
        width: canvas.width,
        height: canvas.height,
        rgba8_premul: std::sync::Arc::new(blurred),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/synth/background.rs"]
mod tests;
