use sha2::Digest as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Stable per-track identifier derived from a source URL.
///
/// The stem is safe to use as a file name. The fingerprint is the SHA-256 of the canonical
/// identifier and is what cache sidecars are checked against.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    stem: String,
    fingerprint: String,
}

impl CacheKey {
    pub fn from_url(url: &str) -> ReelResult<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ReelError::cache("cannot derive a cache key from an empty url"));
        }

        let (canonical, stem) = match youtube_video_id(url) {
            Some(id) => (format!("youtube:{id}"), id.to_string()),
            None => {
                let hash = sha256_hex(url.as_bytes());
                (format!("url:{url}"), format!("u-{}", &hash[..16]))
            }
        };

        Ok(Self {
            fingerprint: sha256_hex(canonical.as_bytes()),
            stem,
        })
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// `<stem>.<ext>`
    pub fn file_name(&self, ext: &str) -> String {
        format!("{}.{ext}", self.stem)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.stem)
    }
}

/// Extract the video id from `watch?v=<id>` and `youtu.be/<id>` URLs.
fn youtube_video_id(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("m.").unwrap_or(rest);

    let id = if let Some(path) = rest.strip_prefix("youtu.be/") {
        path.split(['?', '&', '#', '/']).next()
    } else if rest.starts_with("youtube.com/") || rest.starts_with("music.youtube.com/") {
        let (_, query) = rest.split_once('?')?;
        query
            .split(['&', '#'])
            .find_map(|pair| pair.strip_prefix("v="))
    } else {
        None
    }?;

    (!id.is_empty() && id.bytes().all(is_id_byte)).then_some(id)
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/cache/key.rs"]
mod tests;
