//! Audio acquisition collaborator.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::config::FetchConfig;
use crate::encode::ChildGuard;
use crate::foundation::error::{ReelError, ReelResult};
use crate::worker::CancelToken;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Downloads the audio behind a track URL.
pub trait AudioFetcher: Send + Sync {
    /// Fetch `url` into `dest_dir/filename` and return the written path.
    ///
    /// Implementations stop with [`ReelError::Cancelled`] once `cancel` trips.
    fn fetch_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        filename: &str,
        cancel: &CancelToken,
    ) -> ReelResult<PathBuf>;
}

/// Runs an external downloader (by default `yt-dlp`) with `{url}` and `{out}` substituted.
#[derive(Clone, Debug)]
pub struct CommandFetcher {
    program: String,
    args: Vec<String>,
}

impl CommandFetcher {
    pub fn new(cfg: &FetchConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            args: cfg.args.clone(),
        }
    }

    /// Arguments with placeholders substituted.
    pub fn expand_args(&self, url: &str, out: &Path) -> Vec<String> {
        let out = out.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace("{url}", url).replace("{out}", &out))
            .collect()
    }
}

impl AudioFetcher for CommandFetcher {
    #[tracing::instrument(skip(self, dest_dir, cancel), fields(program = %self.program))]
    fn fetch_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        filename: &str,
        cancel: &CancelToken,
    ) -> ReelResult<PathBuf> {
        cancel.check()?;
        std::fs::create_dir_all(dest_dir).map_err(|e| {
            ReelError::fetch(format!(
                "create download directory '{}': {e}",
                dest_dir.display()
            ))
        })?;
        let out = dest_dir.join(filename);
        let args = self.expand_args(url, &out);
        tracing::debug!(?args, "spawning downloader");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelError::fetch(format!("failed to run '{}': {e}", self.program)))?;
        let stderr = child.stderr.take();
        let mut guard = ChildGuard::new(child);
        let stderr_drain = stderr.map(|mut stderr| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                stderr.read_to_end(&mut bytes).map(|_| bytes)
            })
        });

        // Dropping the guard on an early return kills the downloader.
        let status = loop {
            if cancel.is_cancelled() {
                tracing::warn!(pid = guard.id(), "download cancelled");
                return Err(ReelError::Cancelled);
            }
            match guard.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(ReelError::fetch(format!(
                        "wait for '{}': {e}",
                        self.program
                    )));
                }
            }
        };
        let stderr = stderr_drain
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .unwrap_or_default();

        if !status.success() {
            return Err(ReelError::fetch(format!(
                "'{}' exited with {status} for {url}: {}",
                self.program,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        if !out.is_file() {
            return Err(ReelError::fetch(format!(
                "'{}' reported success but '{}' was not written",
                self.program,
                out.display()
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../tests/unit/fetch.rs"]
mod tests;
