use super::*;
use serde_json::json;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "playreel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn relative_paths_resolve_against_config_dir() {
    let dir = temp_dir("config_resolve");
    std::fs::create_dir_all(&dir).unwrap();
    for f in ["styles.json", "playlist.json", "bg.png"] {
        std::fs::write(dir.join(f), b"{}").unwrap();
    }
    let cfg_path = dir.join("config.json");
    std::fs::write(
        &cfg_path,
        serde_json::to_vec(&json!({
            "mode": "timebar",
            "styles_file": "styles.json",
            "playlist_file": "playlist.json",
            "bg_file": "bg.png",
            "save_dir": "out",
            "paths": {"cache_dir": "cache", "fonts_dir": "fonts"}
        }))
        .unwrap(),
    )
    .unwrap();

    let cfg = RunConfig::load(&cfg_path).unwrap();
    assert_eq!(cfg.save_dir, dir.join("out"));
    assert_eq!(cfg.paths.cache_dir, dir.join("cache"));
    assert_eq!(cfg.cache_policy, CachePolicy::Verify);
    assert_eq!(cfg.timecode_mode, TimecodeMode::Approximate);
    assert_eq!(cfg.worker_timeout(), Duration::from_secs(3600));
    assert_eq!(cfg.fetch.program, "yt-dlp");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn relative_config_path_yields_absolute_paths() {
    let dir = temp_dir("config_relative");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("styles.json"), b"{}").unwrap();
    std::fs::write(
        dir.join("config.json"),
        serde_json::to_vec(&json!({
            "mode": "song",
            "styles_file": "styles.json",
            "save_dir": "out",
            "paths": {"cache_dir": "cache", "fonts_dir": "fonts"}
        }))
        .unwrap(),
    )
    .unwrap();

    // Reach the temp dir through a path relative to the working directory.
    let cwd = std::env::current_dir().unwrap();
    let mut rel = PathBuf::new();
    for _ in cwd.components().skip(1) {
        rel.push("..");
    }
    rel.push(dir.strip_prefix("/").unwrap());
    rel.push("config.json");
    assert!(rel.is_relative());

    let cfg = RunConfig::read(&rel).unwrap();
    for p in [&cfg.styles_file, &cfg.save_dir, &cfg.paths.cache_dir, &cfg.paths.fonts_dir] {
        assert!(p.is_absolute(), "{}", p.display());
    }
    assert!(cfg.paths.cache_dir.ends_with("cache"));
    assert!(cfg.styles_file.is_file());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_mode_inputs_are_config_errors() {
    let dir = temp_dir("config_missing");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("styles.json"), b"{}").unwrap();

    let mut cfg: RunConfig = serde_json::from_value(json!({
        "mode": "tracklist",
        "styles_file": "styles.json",
        "save_dir": "out",
        "paths": {"cache_dir": "cache", "fonts_dir": "fonts"}
    }))
    .unwrap();
    cfg.resolve_relative_to(&dir);

    let err = cfg.validate().unwrap_err();
    assert!(matches!(err, ReelError::Config(_)));
    assert!(err.to_string().contains("playlist_file"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unknown_mode_is_rejected() {
    let parsed = serde_json::from_value::<RunConfig>(json!({
        "mode": "karaoke",
        "styles_file": "s.json",
        "save_dir": "out",
        "paths": {"cache_dir": "c", "fonts_dir": "f"}
    }));
    assert!(parsed.is_err());
}
