//! Run configuration: what to render, where inputs live, and where artifacts go.
//!
//! Every path the pipeline touches is reachable from [`RunConfig`]; nothing reads ambient
//! globals. Relative paths in the document resolve against the directory holding it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Which output the run produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// One progress-bar video per track, concatenated over the assembled audio.
    Timebar,
    /// A single tracklist still per track, highlighted row follows the audio.
    Tracklist,
    /// One local song over a framed cover image.
    Song,
}

/// How much a cache hit has to prove before it is reused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Require a matching sidecar fingerprint and content hash.
    #[default]
    Verify,
    /// Any file with the expected name is a hit.
    TrustFilename,
}

/// How the start offset of each timecode is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimecodeMode {
    /// Advance by `effective + 2` whole seconds per track.
    #[default]
    Approximate,
    /// Use the position where the track starts in the assembled buffer.
    Exact,
}

/// Directories and shared static inputs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Paths {
    pub cache_dir: PathBuf,
    pub fonts_dir: PathBuf,
    /// Canonical silence recording the inter-track pad is trimmed from.
    #[serde(default)]
    pub silence_file: Option<PathBuf>,
}

/// External downloader invocation. `{url}` and `{out}` are substituted in `args`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            args: vec![
                "--quiet".to_string(),
                "--no-playlist".to_string(),
                "-f".to_string(),
                "bestaudio".to_string(),
                "-o".to_string(),
                "{out}".to_string(),
                "{url}".to_string(),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub mode: RenderMode,
    pub styles_file: PathBuf,
    pub save_dir: PathBuf,
    #[serde(default)]
    pub playlist_file: Option<PathBuf>,
    #[serde(default)]
    pub bg_file: Option<PathBuf>,
    #[serde(default)]
    pub img_file: Option<PathBuf>,
    #[serde(default)]
    pub mp3_file: Option<PathBuf>,
    #[serde(default)]
    pub example_frame: bool,
    pub paths: Paths,
    #[serde(default = "default_worker_timeout_secs")]
    pub worker_timeout_secs: u64,
    #[serde(default)]
    pub cache_policy: CachePolicy,
    #[serde(default)]
    pub timecode_mode: TimecodeMode,
    #[serde(default)]
    pub fetch: FetchConfig,
}

fn default_worker_timeout_secs() -> u64 {
    3600
}

impl RunConfig {
    /// Read, resolve and validate a run configuration file.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let cfg = Self::read(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and resolve without validating, so callers can apply overrides first.
    pub fn read(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read run config '{}'", path.display()))?;
        let mut cfg: RunConfig = serde_json::from_slice(&bytes).map_err(|e| {
            ReelError::config(format!("parse run config '{}': {e}", path.display()))
        })?;
        let base = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        // External tools resolve relative paths against their own working files.
        let base = std::path::absolute(base)
            .with_context(|| format!("resolve config directory '{}'", base.display()))?;
        cfg.resolve_relative_to(&base);
        Ok(cfg)
    }

    /// Rebase every relative path onto `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        rebase(&mut self.styles_file);
        rebase(&mut self.save_dir);
        rebase(&mut self.paths.cache_dir);
        rebase(&mut self.paths.fonts_dir);
        for p in [
            &mut self.playlist_file,
            &mut self.bg_file,
            &mut self.img_file,
            &mut self.mp3_file,
            &mut self.paths.silence_file,
        ]
        .into_iter()
        .flatten()
        {
            rebase(p);
        }
    }

    /// Check that the inputs the selected mode needs are present.
    pub fn validate(&self) -> ReelResult<()> {
        match self.mode {
            RenderMode::Timebar => {
                self.require_file("playlist_file", self.playlist_file.as_deref())?;
                self.require_file("bg_file", self.bg_file.as_deref())?;
            }
            RenderMode::Tracklist => {
                self.require_file("playlist_file", self.playlist_file.as_deref())?;
                self.require_file("img_file", self.img_file.as_deref())?;
                if let Some(bg) = self.bg_file.as_deref() {
                    self.require_file("bg_file", Some(bg))?;
                }
            }
            RenderMode::Song => {
                self.require_file("img_file", self.img_file.as_deref())?;
                if !self.example_frame {
                    self.require_file("mp3_file", self.mp3_file.as_deref())?;
                }
            }
        }
        self.require_file("styles_file", Some(&self.styles_file))?;
        if let Some(silence) = self.paths.silence_file.as_deref() {
            self.require_file("paths.silence_file", Some(silence))?;
        }
        if self.worker_timeout_secs == 0 {
            return Err(ReelError::config("worker_timeout_secs must be > 0"));
        }
        if self.fetch.program.trim().is_empty() {
            return Err(ReelError::config("fetch.program must be non-empty"));
        }
        Ok(())
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }

    fn require_file(&self, what: &str, path: Option<&Path>) -> ReelResult<()> {
        let path = path.ok_or_else(|| {
            ReelError::config(format!("'{what}' is required for {:?} mode", self.mode))
        })?;
        if !path.is_file() {
            return Err(ReelError::config(format!(
                "'{what}' does not exist: '{}'",
                path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
