use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};

/// Internal PCM format: interleaved `f32le`, 48 kHz, stereo.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
pub const MIX_CHANNELS: u16 = 2;

/// Decode any audio container `ffmpeg` understands into raw internal-format PCM at `dst`.
pub fn transcode_to_f32le(src: &Path, dst: &Path) -> ReelResult<()> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-i"])
        .arg(src)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &MIX_CHANNELS.to_string(),
            "-ar",
            &MIX_SAMPLE_RATE.to_string(),
        ])
        .arg(dst)
        .output()
        .map_err(|e| {
            ReelError::render(format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(ReelError::render(format!(
            "ffmpeg audio decode failed for '{}': {}",
            src.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}
