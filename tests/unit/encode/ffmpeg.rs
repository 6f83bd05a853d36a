use super::*;

fn frame(w: u32, h: u32) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: vec![0; (w * h * 4) as usize],
        premultiplied: true,
    }
}

#[test]
fn concat_list_quotes_every_part() {
    let parts = vec![
        PathBuf::from("/cache/u-1.mp4"),
        PathBuf::from("/cache/it's.mp4"),
    ];
    assert_eq!(
        concat_list(&parts).unwrap(),
        "file '/cache/u-1.mp4'\nfile '/cache/it'\\''s.mp4'\n"
    );
}

#[test]
fn concat_list_makes_relative_parts_absolute() {
    let list = concat_list(&[PathBuf::from("cache/aaaaaaaaaaa.mp4")]).unwrap();
    let cwd = std::env::current_dir().unwrap();
    let expected = cwd.join("cache/aaaaaaaaaaa.mp4");
    assert_eq!(list, format!("file '{}'\n", expected.display()));

    let line = list.trim_end();
    let path = line
        .strip_prefix("file '")
        .and_then(|l| l.strip_suffix('\''))
        .unwrap();
    assert!(Path::new(path).is_absolute());
}

#[test]
fn concat_of_nothing_is_a_render_error() {
    let out = std::env::temp_dir().join("playreel_concat_empty.mp4");
    assert!(matches!(
        concat_videos(&[], None, &out),
        Err(ReelError::Render(_))
    ));
}

#[test]
fn sink_rejects_odd_sizes_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(
        std::env::temp_dir().join("playreel_odd.mp4"),
    ));
    assert!(sink.begin(SinkConfig::silent(63, 48)).is_err());
    let mut cfg = SinkConfig::silent(64, 48);
    cfg.fps = 0;
    assert!(sink.begin(cfg).is_err());
}

#[test]
fn frames_before_begin_are_rejected() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(
        std::env::temp_dir().join("playreel_unstarted.mp4"),
    ));
    assert!(sink.push_frame(0, &frame(2, 2)).is_err());
    assert!(sink.end().is_err());
}

#[test]
fn child_guard_kills_on_drop() {
    let Ok(child) = Command::new("sleep")
        .arg("30")
        .stdout(Stdio::null())
        .spawn()
    else {
        return;
    };
    let pid = child.id();
    let start = std::time::Instant::now();
    drop(ChildGuard::new(child));
    assert!(start.elapsed() < std::time::Duration::from_secs(10));
    assert!(!Path::new(&format!("/proc/{pid}")).exists());
}

#[cfg(feature = "media-ffmpeg")]
#[test]
fn sink_writes_a_playable_file() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let out = std::env::temp_dir().join(format!("playreel_sink_{}.mp4.partial", std::process::id()));
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(SinkConfig::silent(16, 16)).unwrap();
    for i in 0..3 {
        sink.push_frame(i, &frame(16, 16)).unwrap();
    }
    sink.end().unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    std::fs::remove_file(&out).ok();
}

#[cfg(unix)]
#[test]
fn exited_child_disarms_the_guard() {
    let mut guard = ChildGuard::new(Command::new("true").spawn().unwrap());
    let status = loop {
        if let Some(status) = guard.try_wait().unwrap() {
            break status;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    };
    assert!(status.success());
    assert!(guard.try_wait().is_err());
    assert_eq!(guard.id(), None);
}
