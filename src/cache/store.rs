use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use sha2::Digest as _;

use crate::cache::key::CacheKey;
use crate::config::CachePolicy;
use crate::foundation::error::{ReelError, ReelResult};

const STAGING_SUFFIX: &str = "partial";
const SIDECAR_SUFFIX: &str = "meta.json";

/// Integrity record written next to every committed artifact.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sidecar {
    pub key_fingerprint: String,
    pub tag: String,
    pub content_sha256: String,
    pub bytes: u64,
}

/// Flat directory of fetched and derived per-track artifacts.
///
/// Artifacts are written to a staging path first and published with [`ArtifactCache::commit`],
/// so a reader never observes a half-written file under its final name. Nothing is ever evicted.
#[derive(Clone, Debug)]
pub struct ArtifactCache {
    root: PathBuf,
    policy: CachePolicy,
}

impl ArtifactCache {
    /// Cache rooted at `root`, creating the directory.
    pub fn open(root: impl Into<PathBuf>, policy: CachePolicy) -> ReelResult<Self> {
        let cache = Self::new(root, policy);
        cache.create_root()?;
        Ok(cache)
    }

    /// Cache rooted at `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>, policy: CachePolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn create_root(&self) -> ReelResult<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create cache directory '{}'", self.root.display()))?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Final location of `key`'s artifact with extension `ext`, whether or not it exists.
    pub fn artifact_path(&self, key: &CacheKey, ext: &str) -> PathBuf {
        self.root.join(key.file_name(ext))
    }

    fn sidecar_path(&self, key: &CacheKey, ext: &str) -> PathBuf {
        self.root
            .join(format!("{}.{SIDECAR_SUFFIX}", key.file_name(ext)))
    }

    /// Return the committed artifact for `(key, ext)` if it is usable under the cache policy.
    pub fn lookup(&self, key: &CacheKey, ext: &str, tag: &str) -> Option<PathBuf> {
        let path = self.artifact_path(key, ext);
        if !path.is_file() {
            tracing::debug!(key = %key, ext, "cache miss");
            return None;
        }
        if self.policy == CachePolicy::TrustFilename {
            tracing::debug!(key = %key, ext, "cache hit (trusted by name)");
            return Some(path);
        }

        match self.verify(key, ext, tag, &path) {
            Ok(()) => {
                tracing::debug!(key = %key, ext, "cache hit");
                Some(path)
            }
            Err(reason) => {
                tracing::warn!(
                    key = %key,
                    path = %path.display(),
                    %reason,
                    "cached artifact failed verification, treating as a miss"
                );
                None
            }
        }
    }

    fn verify(&self, key: &CacheKey, ext: &str, tag: &str, path: &Path) -> Result<(), String> {
        let sidecar_path = self.sidecar_path(key, ext);
        let bytes = std::fs::read(&sidecar_path).map_err(|e| format!("no readable sidecar: {e}"))?;
        let sidecar: Sidecar =
            serde_json::from_slice(&bytes).map_err(|e| format!("malformed sidecar: {e}"))?;
        if sidecar.key_fingerprint != key.fingerprint() {
            return Err("key fingerprint mismatch".to_string());
        }
        if sidecar.tag != tag {
            return Err(format!("tag mismatch (cached '{}')", sidecar.tag));
        }
        let (digest, len) = hash_file(path).map_err(|e| format!("hash failed: {e}"))?;
        if len != sidecar.bytes || digest != sidecar.content_sha256 {
            return Err("content hash mismatch".to_string());
        }
        Ok(())
    }

    /// Path the producer writes the artifact to before [`ArtifactCache::commit`].
    pub fn store_path(&self, key: &CacheKey, ext: &str) -> PathBuf {
        self.root
            .join(format!("{}.{STAGING_SUFFIX}", key.file_name(ext)))
    }

    /// Publish the staged artifact under its final name and record its sidecar.
    pub fn commit(&self, key: &CacheKey, ext: &str, tag: &str) -> ReelResult<PathBuf> {
        let staged = self.store_path(key, ext);
        if !staged.is_file() {
            return Err(ReelError::cache(format!(
                "nothing staged at '{}'",
                staged.display()
            )));
        }
        let (content_sha256, bytes) = hash_file(&staged)
            .with_context(|| format!("hash staged artifact '{}'", staged.display()))?;
        let sidecar = Sidecar {
            key_fingerprint: key.fingerprint().to_string(),
            tag: tag.to_string(),
            content_sha256,
            bytes,
        };

        let final_path = self.artifact_path(key, ext);
        std::fs::rename(&staged, &final_path).map_err(|e| {
            ReelError::cache(format!(
                "publish '{}' -> '{}': {e}",
                staged.display(),
                final_path.display()
            ))
        })?;

        let sidecar_path = self.sidecar_path(key, ext);
        let sidecar_tmp = sidecar_path.with_extension(format!("json.{STAGING_SUFFIX}"));
        let json = serde_json::to_vec_pretty(&sidecar)
            .map_err(|e| ReelError::cache(format!("serialize sidecar: {e}")))?;
        std::fs::write(&sidecar_tmp, json)
            .with_context(|| format!("write sidecar '{}'", sidecar_tmp.display()))?;
        std::fs::rename(&sidecar_tmp, &sidecar_path)
            .with_context(|| format!("publish sidecar '{}'", sidecar_path.display()))?;

        tracing::debug!(key = %key, ext, bytes = sidecar.bytes, "cache commit");
        Ok(final_path)
    }
}

fn hash_file(path: &Path) -> std::io::Result<(String, u64)> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = sha2::Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    let mut out = String::with_capacity(64);
    for b in hasher.finalize() {
        out.push_str(&format!("{b:02x}"));
    }
    Ok((out, total))
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
