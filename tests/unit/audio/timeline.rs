use super::*;

const RATE: u32 = 1_000;

fn track(secs: u64) -> AudioBuffer {
    AudioBuffer::new(RATE, 1, vec![0.1; (secs * 1_000) as usize]).unwrap()
}

fn timeline(mode: TimecodeMode) -> AudioTimeline {
    AudioTimeline::new(SilencePad::digital(RATE, 1).unwrap(), mode)
}

#[test]
fn two_tracks_produce_the_documented_timecodes() {
    for mode in [TimecodeMode::Approximate, TimecodeMode::Exact] {
        let mut tl = timeline(mode);
        assert_eq!(tl.append_track(&track(10), 0, 0).unwrap(), 10);
        tl.record_timecode("First", "https://youtube.com/watch?v=a").unwrap();
        assert_eq!(tl.append_track(&track(8), 0, 0).unwrap(), 8);
        tl.record_timecode("Second", "https://youtube.com/watch?v=b").unwrap();

        let (audio, entries) = tl.finish().unwrap();
        let lines: Vec<String> = entries.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "00:00 First (https://youtube.com/watch?v=a)",
                "00:12 Second (https://youtube.com/watch?v=b)",
            ],
            "{mode:?}"
        );
        assert_eq!(audio.duration_ms(), 18_000 + 2 * PAD_MS - 3 * CROSSFADE_MS);
    }
}

#[test]
fn length_follows_the_closed_form_with_crops() {
    let mut tl = timeline(TimecodeMode::Approximate);
    let mut sum = 0;
    for (secs, cs, ce) in [(30u64, 5u64, 3u64), (12, 0, 2), (7, 1, 0)] {
        sum += tl.append_track(&track(secs), cs, ce).unwrap();
        tl.record_timecode("t", "u").unwrap();
    }
    assert_eq!(sum, 22 + 10 + 6);
    let n = 3;
    let (audio, entries) = tl.finish().unwrap();
    assert_eq!(
        audio.duration_ms(),
        sum * 1_000 + n * PAD_MS - (2 * n - 1) * CROSSFADE_MS
    );
    let offsets: Vec<u64> = entries.iter().map(|e| e.offset_secs).collect();
    assert_eq!(offsets, vec![0, 24, 36]);
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn fractional_durations_are_floored() {
    let mut tl = timeline(TimecodeMode::Approximate);
    let raw = AudioBuffer::new(RATE, 1, vec![0.0; 10_700]).unwrap();
    assert_eq!(tl.append_track(&raw, 0, 0).unwrap(), 10);
}

#[test]
fn crops_that_consume_the_track_are_rejected() {
    let mut tl = timeline(TimecodeMode::Approximate);
    assert!(matches!(
        tl.append_track(&track(10), 6, 4),
        Err(ReelError::Timeline(_))
    ));
    assert!(matches!(
        tl.append_track(&track(10), 8, 5),
        Err(ReelError::Timeline(_))
    ));
    assert!(tl.is_empty());
}

#[test]
fn state_machine_misuse_is_reported() {
    let mut tl = timeline(TimecodeMode::Approximate);
    assert!(tl.record_timecode("t", "u").is_err());

    tl.append_track(&track(3), 0, 0).unwrap();
    assert!(tl.append_track(&track(3), 0, 0).is_err());
    tl.record_timecode("t", "u").unwrap();
    assert!(tl.record_timecode("t", "u").is_err());

    assert!(matches!(
        timeline(TimecodeMode::Approximate).finish(),
        Err(ReelError::Timeline(_))
    ));
}

#[test]
fn silence_pad_is_trimmed_from_a_longer_source() {
    let long = AudioBuffer::new(RATE, 1, vec![0.01; 5_000]).unwrap();
    let pad = SilencePad::from_source(&long).unwrap();
    assert_eq!(pad.buffer().duration_ms(), PAD_MS);

    let short = AudioBuffer::new(RATE, 1, vec![0.0; 1_000]).unwrap();
    assert!(SilencePad::from_source(&short).is_err());
}

#[test]
fn timecode_file_has_one_line_per_track() {
    let dir = std::env::temp_dir().join(format!("playreel_timecodes_{}", std::process::id()));
    let path = dir.join("timecodes.txt");
    let entries = vec![
        TimecodeEntry {
            offset_secs: 0,
            title: "A".into(),
            url: "u1".into(),
        },
        TimecodeEntry {
            offset_secs: 3_725,
            title: "B".into(),
            url: "u2".into(),
        },
    ];
    write_timecodes(&path, &entries).unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "00:00 A (u1)\n62:05 B (u2)\n"
    );
    std::fs::remove_dir_all(&dir).ok();
}
