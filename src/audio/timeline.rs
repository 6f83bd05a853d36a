//! Single-threaded assembly of the playlist's audio track and its timecodes.
//!
//! Tracks are appended strictly in playlist order. Every track is followed by a silence pad,
//! and every join (track onto timeline, pad onto track) is a short crossfade, so after `N`
//! tracks the buffer is exactly `sum(effective) + N * PAD_MS - (2N - 1) * CROSSFADE_MS` long.

use std::path::Path;

use anyhow::Context as _;

use crate::audio::pcm::AudioBuffer;
use crate::config::TimecodeMode;
use crate::foundation::core::format_mm_ss;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::frames_to_ms;

pub const CROSSFADE_MS: u64 = 100;
pub const PAD_MS: u64 = 2200;
/// Whole seconds the approximate timecode mode adds per track on top of its duration.
pub const PAD_SECS_APPROX: u64 = 2;

/// Inter-track silence, exactly [`PAD_MS`] long.
#[derive(Clone, Debug)]
pub struct SilencePad(AudioBuffer);

impl SilencePad {
    /// Trim a recorded silence source to the pad length.
    pub fn from_source(source: &AudioBuffer) -> ReelResult<Self> {
        if source.duration_ms() < PAD_MS {
            return Err(ReelError::timeline(format!(
                "silence source is {} ms, need at least {PAD_MS} ms",
                source.duration_ms()
            )));
        }
        Ok(Self(source.slice_ms(0, PAD_MS)))
    }

    pub fn digital(sample_rate: u32, channels: u16) -> ReelResult<Self> {
        Ok(Self(AudioBuffer::silence(sample_rate, channels, PAD_MS)?))
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.0
    }
}

/// Where a track starts in the final output.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TimecodeEntry {
    pub offset_secs: u64,
    pub title: String,
    pub url: String,
}

impl std::fmt::Display for TimecodeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({})",
            format_mm_ss(self.offset_secs),
            self.title,
            self.url
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingTrack {
    effective_secs: u64,
    start_frame: usize,
}

/// Growing audio buffer plus the timecodes of everything appended so far.
///
/// Empty until the first [`AudioTimeline::append_track`]; each append must be followed by one
/// [`AudioTimeline::record_timecode`].
#[derive(Debug)]
pub struct AudioTimeline {
    buffer: Option<AudioBuffer>,
    pad: SilencePad,
    mode: TimecodeMode,
    running_offset_secs: u64,
    pending: Option<PendingTrack>,
    entries: Vec<TimecodeEntry>,
}

impl AudioTimeline {
    pub fn new(pad: SilencePad, mode: TimecodeMode) -> Self {
        Self {
            buffer: None,
            pad,
            mode,
            running_offset_secs: 0,
            pending: None,
            entries: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_none()
    }

    pub fn duration_ms(&self) -> u64 {
        self.buffer.as_ref().map_or(0, AudioBuffer::duration_ms)
    }

    /// Crop `raw`, append it and the silence pad, and return the effective whole seconds.
    pub fn append_track(
        &mut self,
        raw: &AudioBuffer,
        crop_start: u64,
        crop_end: u64,
    ) -> ReelResult<u64> {
        if self.pending.is_some() {
            return Err(ReelError::timeline(
                "previous track was appended without recording its timecode",
            ));
        }
        let raw_secs = raw.duration_secs();
        let effective_secs = raw_secs
            .checked_sub(crop_start)
            .and_then(|v| v.checked_sub(crop_end))
            .filter(|&v| v > 0)
            .ok_or_else(|| {
                ReelError::timeline(format!(
                    "crop_start {crop_start}s + crop_end {crop_end}s leaves nothing of a {raw_secs}s track"
                ))
            })?;

        let start_ms = crop_start * 1000;
        let segment = raw.slice_ms(start_ms, start_ms + effective_secs * 1000);

        let start_frame = match self.buffer.as_mut() {
            None => {
                self.buffer = Some(segment);
                0
            }
            Some(buffer) => {
                buffer.crossfade_append(&segment, CROSSFADE_MS)?;
                buffer.frames() - segment.frames()
            }
        };
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.crossfade_append(self.pad.buffer(), CROSSFADE_MS)?;
        }

        self.pending = Some(PendingTrack {
            effective_secs,
            start_frame,
        });
        Ok(effective_secs)
    }

    /// Timecode of the track appended last.
    pub fn record_timecode(&mut self, title: &str, url: &str) -> ReelResult<TimecodeEntry> {
        let pending = self.pending.take().ok_or_else(|| {
            ReelError::timeline("record_timecode called without an appended track")
        })?;
        let offset_secs = match self.mode {
            TimecodeMode::Approximate => self.running_offset_secs,
            TimecodeMode::Exact => {
                let rate = self.buffer.as_ref().map_or(0, |b| b.sample_rate);
                frames_to_ms(pending.start_frame, rate) / 1000
            }
        };
        self.running_offset_secs += pending.effective_secs + PAD_SECS_APPROX;

        let entry = TimecodeEntry {
            offset_secs,
            title: title.to_string(),
            url: url.to_string(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub fn entries(&self) -> &[TimecodeEntry] {
        &self.entries
    }

    pub fn finish(self) -> ReelResult<(AudioBuffer, Vec<TimecodeEntry>)> {
        if self.pending.is_some() {
            return Err(ReelError::timeline(
                "last track was appended without recording its timecode",
            ));
        }
        let buffer = self
            .buffer
            .ok_or_else(|| ReelError::timeline("cannot finish an empty timeline"))?;
        Ok((buffer, self.entries))
    }
}

/// One `MM:SS <title> (<url>)` line per entry, in order.
pub fn write_timecodes(path: &Path, entries: &[TimecodeEntry]) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory '{}'", parent.display()))?;
    }
    let mut text = String::new();
    for e in entries {
        text.push_str(&e.to_string());
        text.push('\n');
    }
    std::fs::write(path, text).with_context(|| format!("write timecodes '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/timeline.rs"]
mod tests;
