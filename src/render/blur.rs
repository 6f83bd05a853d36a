use crate::foundation::core::PixelRect;
use crate::foundation::error::{ReelError, ReelResult};

const Q16_ONE: u32 = 1 << 16;

/// Symmetric Gaussian kernel in Q16 fixed point, stored from the center tap outwards.
///
/// The taps always sum to exactly `1.0`: tails are floored and the center takes the remainder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlurKernel {
    half: Vec<u32>,
}

impl BlurKernel {
    /// Kernel for standard deviation `sigma`, reaching `ceil(3 * sigma)` pixels each way.
    ///
    /// `sigma == 0` yields `None`: nothing to blur.
    pub fn gaussian(sigma: f32) -> ReelResult<Option<Self>> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(ReelError::render("blur sigma must be finite and >= 0"));
        }
        let radius = (3.0 * sigma).ceil() as usize;
        if radius == 0 {
            return Ok(None);
        }

        let two_var = 2.0 * f64::from(sigma) * f64::from(sigma);
        let raw: Vec<f64> = (0..=radius)
            .map(|d| (-((d * d) as f64) / two_var).exp())
            .collect();
        let total = raw[0] + 2.0 * raw[1..].iter().sum::<f64>();

        let mut half: Vec<u32> = raw
            .iter()
            .map(|w| (w / total * f64::from(Q16_ONE)).floor() as u32)
            .collect();
        let tails: u32 = half[1..].iter().sum();
        half[0] = Q16_ONE - 2 * tails;
        Ok(Some(Self { half }))
    }

    pub fn radius(&self) -> u32 {
        (self.half.len() - 1) as u32
    }

    /// Weighted sum along one axis; `fetch(offset)` yields the byte index of each sample.
    fn apply(&self, buf: &[u8], fetch: impl Fn(i64) -> usize) -> [u8; 4] {
        let mut acc = [0u64; 4];
        let mut add = |idx: usize, w: u32| {
            for (c, a) in acc.iter_mut().enumerate() {
                *a += u64::from(w) * u64::from(buf[idx + c]);
            }
        };
        add(fetch(0), self.half[0]);
        for (d, &w) in self.half.iter().enumerate().skip(1) {
            let d = d as i64;
            add(fetch(-d), w);
            add(fetch(d), w);
        }
        acc.map(|v| ((v + u64::from(Q16_ONE / 2)) >> 16).min(255) as u8)
    }
}

/// Gaussian blur of a whole premultiplied RGBA8 image. `sigma == 0` returns the input unchanged.
pub fn gaussian_blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> ReelResult<Vec<u8>> {
    let full = PixelRect::new(0, 0, i64::from(width), i64::from(height));
    blur_regions_rgba8_premul(src, width, height, &[full], sigma)
}

/// Copy of `src` where each rect is replaced by its blurred pixels.
///
/// Every region samples the untouched source, so overlapping or adjacent rects do not feed
/// into each other. Samples outside the image clamp to the nearest edge pixel.
pub fn blur_regions_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    rects: &[PixelRect],
    sigma: f32,
) -> ReelResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ReelError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(ReelError::render(format!(
            "blur expects {expected_len} bytes for {width}x{height}, got {}",
            src.len()
        )));
    }
    let mut out = src.to_vec();
    let Some(kernel) = BlurKernel::gaussian(sigma)? else {
        return Ok(out);
    };
    let bounds = PixelRect::new(0, 0, i64::from(width), i64::from(height));
    for rect in rects {
        let rect = rect.intersect(bounds);
        if !rect.is_empty() {
            blur_region(src, &mut out, width, height, rect, &kernel);
        }
    }
    Ok(out)
}

/// Horizontal pass over `rect`'s columns plus a vertical apron, then vertical pass into `dst`.
fn blur_region(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    rect: PixelRect,
    k: &BlurKernel,
) {
    let (w, h) = (i64::from(width), i64::from(height));
    let r = i64::from(k.radius());
    let ay0 = (rect.y0 - r).max(0);
    let ay1 = (rect.y1 + r).min(h);
    let cols = rect.width();

    let mut strip = Vec::with_capacity((cols * (ay1 - ay0) * 4) as usize);
    for y in ay0..ay1 {
        let row = y * w;
        for x in rect.x0..rect.x1 {
            let px = k.apply(src, |d| ((row + (x + d).clamp(0, w - 1)) * 4) as usize);
            strip.extend_from_slice(&px);
        }
    }

    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            let col = x - rect.x0;
            let px = k.apply(&strip, |d| {
                let sy = (y + d).clamp(0, h - 1) - ay0;
                ((sy * cols + col) * 4) as usize
            });
            let idx = ((y * w + x) * 4) as usize;
            dst[idx..idx + 4].copy_from_slice(&px);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
