use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{frames_to_ms, ms_to_frames};

/// Interleaved `f32` PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> ReelResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(ReelError::timeline(
                "audio sample_rate and channels must be non-zero",
            ));
        }
        if !samples.len().is_multiple_of(usize::from(channels)) {
            return Err(ReelError::timeline(format!(
                "{} samples do not divide into {channels} channels",
                samples.len()
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Digital silence of `ms` milliseconds.
    pub fn silence(sample_rate: u32, channels: u16, ms: u64) -> ReelResult<Self> {
        let frames = ms_to_frames(ms, sample_rate);
        Self::new(
            sample_rate,
            channels,
            vec![0.0; frames * usize::from(channels)],
        )
    }

    /// Sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in whole milliseconds, floored.
    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.frames(), self.sample_rate)
    }

    /// Length in whole seconds, floored.
    pub fn duration_secs(&self) -> u64 {
        self.duration_ms() / 1000
    }

    /// Copy of `[start_ms, end_ms)`; bounds are clamped to the buffer.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let frames = self.frames();
        let a = ms_to_frames(start_ms, self.sample_rate).min(frames);
        let b = ms_to_frames(end_ms, self.sample_rate).clamp(a, frames);
        let ch = usize::from(self.channels);
        AudioBuffer {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: self.samples[a * ch..b * ch].to_vec(),
        }
    }

    fn check_same_format(&self, other: &AudioBuffer) -> ReelResult<()> {
        if self.sample_rate != other.sample_rate || self.channels != other.channels {
            return Err(ReelError::timeline(format!(
                "audio format mismatch: {} Hz x{} vs {} Hz x{}",
                self.sample_rate, self.channels, other.sample_rate, other.channels
            )));
        }
        Ok(())
    }

    /// Append `next`, overlapping the last `crossfade_ms` of `self` with the first `crossfade_ms`
    /// of `next` under a linear equal-gain ramp.
    ///
    /// The result is `len(self) + len(next) - crossfade` long. Either side being shorter than
    /// the crossfade is an error.
    pub fn crossfade_append(&mut self, next: &AudioBuffer, crossfade_ms: u64) -> ReelResult<()> {
        self.check_same_format(next)?;
        let xf = ms_to_frames(crossfade_ms, self.sample_rate);
        if self.frames() < xf || next.frames() < xf {
            return Err(ReelError::timeline(format!(
                "crossfade of {crossfade_ms} ms is longer than a segment ({} ms / {} ms)",
                self.duration_ms(),
                next.duration_ms()
            )));
        }

        let ch = usize::from(self.channels);
        let overlap_start = (self.frames() - xf) * ch;
        for i in 0..xf {
            let t = i as f32 / xf as f32;
            for c in 0..ch {
                let a = &mut self.samples[overlap_start + i * ch + c];
                *a = *a * (1.0 - t) + next.samples[i * ch + c] * t;
            }
        }
        self.samples.extend_from_slice(&next.samples[xf * ch..]);
        Ok(())
    }

    /// Read raw interleaved little-endian `f32` samples.
    pub fn read_f32le(path: &Path, sample_rate: u32, channels: u16) -> ReelResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read pcm '{}'", path.display()))?;
        if !bytes.len().is_multiple_of(4) {
            return Err(ReelError::timeline(format!(
                "'{}' is not aligned to f32 samples",
                path.display()
            )));
        }
        let samples = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::new(sample_rate, channels, samples)
    }

    pub fn write_f32le(&self, path: &Path) -> ReelResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory '{}'", parent.display()))?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("create pcm '{}'", path.display()))?;
        let mut out = std::io::BufWriter::new(file);
        self.write_f32le_to(&mut out)
            .and_then(|()| out.flush())
            .with_context(|| format!("write pcm '{}'", path.display()))?;
        Ok(())
    }

    /// Stream the samples as little-endian `f32` without an intermediate byte buffer.
    pub fn write_f32le_to<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        for s in &self.samples {
            out.write_all(&s.to_le_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pcm.rs"]
mod tests;
