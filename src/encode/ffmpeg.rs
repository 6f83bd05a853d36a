use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::canvas::{FrameRGBA, flatten_premul_over_bg_to_opaque_rgba8};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output file. The container is always MP4 regardless of the extension, so staging paths
    /// such as `*.mp4.partial` work.
    pub out_path: PathBuf,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Owns a spawned child process. Dropping the guard before the child has been reaped kills and
/// reaps it, so an abandoned encode or download never outlives its owner.
pub struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    pub fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Non-blocking exit check. A child that has exited disarms the guard.
    pub fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| std::io::Error::other("child already reaped"))?;
        let status = child.try_wait()?;
        if status.is_some() {
            self.child = None;
        }
        Ok(status)
    }

    /// Wait for a normal exit and disarm the guard.
    pub fn wait(mut self) -> std::io::Result<ExitStatus> {
        match self.child.take() {
            Some(mut child) => child.wait(),
            None => Err(std::io::Error::other("child already reaped")),
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::debug!(pid = child.id(), "killing abandoned child process");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// Audio is optional and provided through `SinkConfig.audio`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    // Field order matters: stdin must close before the guard reaps the child.
    stdin: Option<ChildStdin>,
    child: Option<ChildGuard>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<u64>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            stdin: None,
            child: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if cfg.fps == 0 {
            return Err(ReelError::render("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::render("ffmpeg sink width/height must be non-zero"));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::render(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        ensure_parent_dir(&self.opts.out_path)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames. `ffmpeg` does not understand premul, so frames are
        // flattened before they are written (push_frame).
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = cfg.audio.as_ref() {
            push_audio_input(&mut cmd, audio)?;
            cmd.args([
                "-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac", "-shortest",
            ]);
        } else {
            cmd.args(["-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"]);
        }
        cmd.args(["-movflags", "+faststart", "-f", "mp4"])
            .arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::render(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let guard = ChildGuard::new(child);
        let stdin = stdin.ok_or_else(|| ReelError::render("failed to open ffmpeg stdin"))?;
        let mut stderr = stderr.ok_or_else(|| ReelError::render("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });
        tracing::debug!(
            pid = guard.id(),
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            audio = cfg.audio.is_some(),
            "ffmpeg sink started"
        );

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.stdin = Some(stdin);
        self.child = Some(guard);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::render("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(ReelError::render(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::render(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        if frame.premultiplied {
            flatten_premul_over_bg_to_opaque_rgba8(
                &mut self.scratch,
                &frame.data,
                self.opts.bg_rgba,
            )?;
        } else if frame.data.len() == self.scratch.len() {
            self.scratch.copy_from_slice(&frame.data);
        } else {
            return Err(ReelError::render("frame.data size mismatch with width*height*4"));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::render("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelError::render(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let guard = self
            .child
            .take()
            .ok_or_else(|| ReelError::render("ffmpeg sink not started"))?;

        let status = guard.wait().map_err(|e| {
            ReelError::render(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::render("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelError::render(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::render(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

fn push_audio_input(cmd: &mut Command, audio: &AudioInputConfig) -> ReelResult<()> {
    if audio.sample_rate == 0 || audio.channels == 0 {
        return Err(ReelError::render(
            "audio sample_rate and channels must be non-zero when audio is enabled",
        ));
    }
    cmd.args([
        "-f",
        "f32le",
        "-ar",
        &audio.sample_rate.to_string(),
        "-ac",
        &audio.channels.to_string(),
        "-i",
    ])
    .arg(&audio.path);
    Ok(())
}

/// `ffmpeg` concat-demuxer list for `parts`, one `file '<path>'` line each.
///
/// The demuxer resolves relative entries against the list file's own directory, so every part
/// is written as an absolute path.
pub fn concat_list(parts: &[PathBuf]) -> ReelResult<String> {
    use anyhow::Context as _;
    let mut list = String::new();
    for p in parts {
        let abs = std::path::absolute(p)
            .with_context(|| format!("resolve concat part '{}'", p.display()))?;
        let escaped = abs.to_string_lossy().replace('\'', r"'\''");
        list.push_str(&format!("file '{escaped}'\n"));
    }
    Ok(list)
}

/// Join same-format MP4 `parts` without re-encoding video, optionally replacing the audio with
/// raw PCM.
pub fn concat_videos(
    parts: &[PathBuf],
    audio: Option<&AudioInputConfig>,
    out_path: &Path,
) -> ReelResult<()> {
    if parts.is_empty() {
        return Err(ReelError::render("nothing to concatenate"));
    }
    ensure_parent_dir(out_path)?;

    let list_path = out_path.with_extension("concat.txt");
    {
        use anyhow::Context as _;
        std::fs::write(&list_path, concat_list(parts)?)
            .with_context(|| format!("write concat list '{}'", list_path.display()))?;
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_path);
    if let Some(audio) = audio {
        push_audio_input(&mut cmd, audio)?;
        cmd.args([
            "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-shortest",
        ]);
    } else {
        cmd.args(["-an", "-c:v", "copy"]);
    }
    cmd.args(["-movflags", "+faststart", "-f", "mp4"])
        .arg(out_path);

    let out = cmd
        .output()
        .map_err(|e| ReelError::render(format!("failed to run ffmpeg concat: {e}")));
    let _ = std::fs::remove_file(&list_path);
    let out = out?;
    if !out.status.success() {
        return Err(ReelError::render(format!(
            "ffmpeg concat into '{}' failed: {}",
            out_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
