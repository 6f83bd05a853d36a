use super::*;
use serde_json::json;

fn big_style() -> TimebarStyle {
    serde_json::from_value(json!({
        "blur_radius": 10.0,
        "main_border": {"margin": 30, "width": 15},
        "main_rect": {"width": 1000, "height": 200, "margin_bottom": 100},
        "timebar": {
            "width": 800, "height": 10, "margin_bottom": 40,
            "color_filled": "#ffffff", "color_empty": "#808080",
            "border_color": "#000000", "border_width": 0, "circle_size": 20
        }
    }))
    .unwrap()
}

fn small_style(circle_size: u32) -> TimebarStyle {
    serde_json::from_value(json!({
        "blur_radius": 1.0,
        "main_border": {"margin": 2, "width": 2},
        "main_rect": {"width": 48, "height": 20, "margin_bottom": 4},
        "timebar": {
            "width": 40, "height": 4, "margin_bottom": 6,
            "color_filled": "#ff0000", "color_empty": "#808080",
            "border_color": "#000000", "border_width": 0, "circle_size": circle_size
        }
    }))
    .unwrap()
}

fn small_scene(circle_size: u32) -> TimebarScene {
    let canvas = Canvas::new(64, 48).unwrap();
    let style = small_style(circle_size);
    let bg = image::RgbaImage::from_pixel(64, 48, image::Rgba([0, 0, 80, 255]));
    let background =
        crate::synth::background::timebar_background(&bg, canvas, &style).unwrap();
    let fonts = FontBook::new(std::env::temp_dir().join("playreel_no_fonts"));
    TimebarScene::new(canvas, &style, background, "ignored without a title style", fonts).unwrap()
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn layout_matches_floor_arithmetic() {
    let canvas = Canvas::new(1920, 1080).unwrap();
    let style = big_style();
    let main = main_rect(canvas, &style.main_rect);
    assert_eq!(main, PixelRect::new(460, 780, 1460, 880));

    let bar = bar_rect(main, &style.timebar);
    assert_eq!(bar, PixelRect::new(560, 830, 1360, 840));

    let filled = filled_width(bar.width(), 13, 124);
    assert_eq!(filled, 83);
    assert_eq!(knob_rect(bar, filled, 20), PixelRect::new(633, 825, 653, 845));
}

#[test]
fn border_bands_follow_margin_and_width() {
    let canvas = Canvas::new(100, 50).unwrap();
    let [left, upper, right, lower] = border_bands(canvas, BorderBand { margin: 5, width: 3 });
    assert_eq!(left, PixelRect::new(5, 5, 8, 45));
    assert_eq!(upper, PixelRect::new(5, 5, 95, 8));
    assert_eq!(right, PixelRect::new(92, 5, 95, 45));
    assert_eq!(lower, PixelRect::new(5, 42, 95, 45));
}

#[test]
fn filled_and_unfilled_always_sum_to_bar_width() {
    for total in [1u64, 7, 124, 3601] {
        for t in [0, 1, total / 2, total - 1, total] {
            let f = filled_width(800, t, total);
            let expected = (800 * t / total) as i64;
            assert_eq!(f, expected);
            assert!((0..=800).contains(&f));
            assert_eq!(f + (800 - f), 800);
        }
    }
}

#[test]
fn zero_total_is_full_and_overrun_clamps() {
    assert_eq!(filled_width(800, 0, 0), 800);
    assert_eq!(filled_width(800, 5, 0), 800);
    assert_eq!(filled_width(800, 200, 124), 800);
}

#[test]
fn bar_pixels_split_at_the_fill_boundary() {
    let mut scene = small_scene(0);
    assert_eq!(scene.bar_rect(), PixelRect::new(12, 34, 52, 38));

    let frame = scene.render(1, 2).unwrap();
    assert_eq!((frame.width, frame.height), (64, 48));
    assert_eq!(px(&frame, 13, 35), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 31, 36), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 32, 36), [128, 128, 128, 255]);
    assert_eq!(px(&frame, 50, 35), [128, 128, 128, 255]);
    assert_eq!(px(&frame, 30, 10), [0, 0, 80, 255]);
}

#[test]
fn knob_sits_on_the_boundary() {
    let mut scene = small_scene(6);
    let frame = scene.render(0, 2).unwrap();
    assert_eq!(px(&frame, 12, 36), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 30, 36), [128, 128, 128, 255]);
}

#[test]
fn frames_are_deterministic_and_padding_frames_match_the_final_state() {
    let mut scene = small_scene(6);
    let a = scene.render(1, 3).unwrap();
    let b = scene.render(1, 3).unwrap();
    assert_eq!(a, b);

    let end = scene.render(3, 3).unwrap();
    let past = scene.render(4, 3).unwrap();
    assert_eq!(end, past);
    assert_ne!(a, end);
}

#[test]
fn background_size_must_match_canvas() {
    let canvas = Canvas::new(64, 48).unwrap();
    let wrong = PreparedImage::from_straight(image::RgbaImage::new(10, 10));
    let fonts = FontBook::new(std::env::temp_dir());
    let err = TimebarScene::new(canvas, &small_style(0), wrong, "t", fonts)
        .err()
        .unwrap();
    assert!(matches!(err, ReelError::Render(_)));
}
