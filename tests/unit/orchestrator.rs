use super::*;

use crate::encode::sink::InMemorySink;

#[test]
fn staging_path_appends_partial() {
    assert_eq!(
        staging_path(Path::new("/out/playlist.mp4")),
        PathBuf::from("/out/playlist.mp4.partial")
    );
}

#[test]
fn held_frames_get_consecutive_indices() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![9; 8],
        premultiplied: true,
    };
    let mut sink = InMemorySink::new();
    sink.begin(SinkConfig::silent(2, 1)).unwrap();
    let mut idx = 0;
    push_held(&mut sink, &mut idx, &frame, 3).unwrap();
    push_held(&mut sink, &mut idx, &frame, 2).unwrap();
    sink.end().unwrap();

    let indices: Vec<u64> = sink.frames().iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(idx, 5);
}
