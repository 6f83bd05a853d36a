use super::*;
use serde_json::json;

fn v1_doc() -> serde_json::Value {
    json!({
        "width": 320,
        "height": 180,
        "v1": {
            "blur_radius": 4.0,
            "main_border": {"margin": 8, "width": 6},
            "main_rect": {"width": 200, "height": 60, "margin_bottom": 20},
            "title": {
                "font_name": "Roboto.ttf", "font_size": 18.0,
                "color": "#ffffff", "stroke_color": "black", "stroke_width": 1
            },
            "timebar": {
                "width": 120, "height": 6, "margin_bottom": 12,
                "color_filled": "#ff0000", "color_empty": [40, 40, 40],
                "border_color": "#000", "border_width": 1, "circle_size": 10
            },
            "time": {
                "font_name": "Roboto.ttf", "font_size": 12.0, "color": "white",
                "shift_x": 6, "shift_y": 4
            }
        }
    })
}

#[test]
fn v1_document_parses_with_defaults() {
    let spec: StyleSpec = serde_json::from_value(v1_doc()).unwrap();
    spec.validate().unwrap();
    let v1 = spec.timebar().unwrap();
    assert_eq!(v1.title.as_ref().unwrap().margin_top, 10);
    assert_eq!(v1.time.as_ref().unwrap().text.stroke_width, 0);
    assert_eq!(v1.timebar.color_empty, Rgba8::opaque(40, 40, 40));
    assert!(spec.tracklist().is_err());
}

#[test]
fn unknown_top_level_keys_are_rejected() {
    let mut doc = v1_doc();
    doc["v9"] = json!({});
    assert!(serde_json::from_value::<StyleSpec>(doc).is_err());
}

#[test]
fn oversized_main_rect_is_config_error() {
    let mut doc = v1_doc();
    doc["v1"]["main_rect"]["width"] = json!(400);
    let spec: StyleSpec = serde_json::from_value(doc).unwrap();
    assert!(matches!(spec.validate(), Err(ReelError::Config(_))));
}

#[test]
fn framed_image_must_fit_canvas() {
    let spec: StyleSpec = serde_json::from_value(json!({
        "width": 100, "height": 80,
        "song": {
            "image": {"size": 70, "border_color": "#fff", "border_width": 6},
            "bg": {"blur_radius": 3.0}
        }
    }))
    .unwrap();
    assert!(spec.validate().is_err());
}

#[test]
fn load_reports_path_in_parse_errors() {
    let dir = std::env::temp_dir().join(format!("playreel_style_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("styles.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = StyleSpec::load(&path).unwrap_err();
    assert!(err.to_string().contains("styles.json"));
    std::fs::remove_dir_all(&dir).ok();
}
