use super::*;

fn noise(w: u32, h: u32) -> Vec<u8> {
    (0..(w * h * 4)).map(|i| (i * 37 % 251) as u8).collect()
}

#[test]
fn zero_sigma_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let out = gaussian_blur_rgba8_premul(&src, 1, 2, 0.0).unwrap();
    assert_eq!(out, src);
    assert!(BlurKernel::gaussian(0.0).unwrap().is_none());
}

#[test]
fn kernel_taps_sum_to_one() {
    for sigma in [0.4f32, 1.0, 2.5, 12.0] {
        let k = BlurKernel::gaussian(sigma).unwrap().unwrap();
        assert_eq!(k.radius(), (3.0 * sigma).ceil() as u32);
        let sum = k.half[0] + 2 * k.half[1..].iter().sum::<u32>();
        assert_eq!(sum, Q16_ONE, "sigma {sigma}");
        assert!(k.half.windows(2).all(|p| p[0] >= p[1]));
    }
}

#[test]
fn negative_sigma_is_rejected() {
    assert!(BlurKernel::gaussian(-1.0).is_err());
    assert!(gaussian_blur_rgba8_premul(&[0u8; 4], 1, 1, f32::NAN).is_err());
}

#[test]
fn constant_image_is_unchanged() {
    let (w, h) = (6u32, 4u32);
    let px = [10u8, 20u8, 30u8, 255u8];
    let src = px.repeat((w * h) as usize);
    let out = gaussian_blur_rgba8_premul(&src, w, h, 1.5).unwrap();
    assert_eq!(out, src);
}

#[test]
fn energy_spreads_and_is_conserved() {
    let (w, h) = (9u32, 9u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((4 * w + 4) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = gaussian_blur_rgba8_premul(&src, w, h, 0.6).unwrap();

    let nonzero = out.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(nonzero > 1);
    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 8, "alpha sum {sum_a}");
}

#[test]
fn region_blur_matches_full_blur_inside_and_keeps_the_rest() {
    let (w, h) = (16u32, 12u32);
    let src = noise(w, h);
    let full = gaussian_blur_rgba8_premul(&src, w, h, 1.2).unwrap();
    let rect = PixelRect::new(3, 2, 9, 7);
    let out = blur_regions_rgba8_premul(&src, w, h, &[rect], 1.2).unwrap();

    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let i = ((y * w as i64 + x) * 4) as usize;
            let inside = x >= rect.x0 && x < rect.x1 && y >= rect.y0 && y < rect.y1;
            let expected = if inside { &full[i..i + 4] } else { &src[i..i + 4] };
            assert_eq!(&out[i..i + 4], expected, "({x},{y})");
        }
    }
}

#[test]
fn regions_sample_the_untouched_source() {
    let (w, h) = (12u32, 8u32);
    let src = noise(w, h);
    let full = gaussian_blur_rgba8_premul(&src, w, h, 1.0).unwrap();
    let rects = [PixelRect::new(0, 0, 12, 3), PixelRect::new(0, 2, 12, 8)];
    let out = blur_regions_rgba8_premul(&src, w, h, &rects, 1.0).unwrap();
    assert_eq!(out, full);
}

#[test]
fn rects_outside_the_image_are_clipped() {
    let src = noise(4, 4);
    let out = blur_regions_rgba8_premul(&src, 4, 4, &[PixelRect::new(10, 10, 20, 20)], 1.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn blur_is_deterministic() {
    let src = noise(16, 8);
    let a = gaussian_blur_rgba8_premul(&src, 16, 8, 2.0).unwrap();
    let b = gaussian_blur_rgba8_premul(&src, 16, 8, 2.0).unwrap();
    assert_eq!(a, b);
}

#[test]
fn wrong_buffer_length_is_rejected() {
    assert!(gaussian_blur_rgba8_premul(&[0u8; 7], 1, 2, 1.0).is_err());
}
