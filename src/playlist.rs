use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// One playlist row.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrackDescriptor {
    pub url: String,
    pub title: String,
    /// Seconds trimmed from the start of the source audio.
    pub crop_start: u64,
    /// Seconds trimmed from the end of the source audio.
    pub crop_end: u64,
}

impl TrackDescriptor {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            crop_start: 0,
            crop_end: 0,
        }
    }

    pub fn with_crop(mut self, crop_start: u64, crop_end: u64) -> Self {
        self.crop_start = crop_start;
        self.crop_end = crop_end;
        self
    }

    /// Playable whole seconds left after cropping `raw_secs` (already floored).
    ///
    /// Zero or negative results are reported as `None`; callers turn that into an error.
    pub fn effective_secs(&self, raw_secs: u64) -> Option<u64> {
        raw_secs
            .checked_sub(self.crop_start)
            .and_then(|v| v.checked_sub(self.crop_end))
            .filter(|&v| v > 0)
    }
}

/// Ordered, non-empty list of tracks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<TrackDescriptor>,
}

impl Playlist {
    pub fn new(tracks: Vec<TrackDescriptor>) -> ReelResult<Self> {
        if tracks.is_empty() {
            return Err(ReelError::config("playlist has no tracks"));
        }
        for (i, t) in tracks.iter().enumerate() {
            if t.url.trim().is_empty() {
                return Err(ReelError::config(format!("playlist row {}: empty url", i + 1)));
            }
        }
        Ok(Self { tracks })
    }

    /// Load a JSON array of row objects. Column names are matched case-insensitively.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read playlist file '{}'", path.display()))?;
        let rows: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_slice(&bytes).map_err(|e| {
                ReelError::config(format!("parse playlist file '{}': {e}", path.display()))
            })?;
        Self::from_rows(rows)
    }

    pub fn from_rows(rows: Vec<serde_json::Map<String, serde_json::Value>>) -> ReelResult<Self> {
        let mut tracks = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            tracks.push(parse_row(i + 1, row)?);
        }
        Self::new(tracks)
    }

    pub fn tracks(&self) -> &[TrackDescriptor] {
        &self.tracks
    }

    pub fn titles(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.title.clone()).collect()
    }

    pub fn first(&self) -> &TrackDescriptor {
        &self.tracks[0]
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

fn parse_row(
    row_no: usize,
    row: serde_json::Map<String, serde_json::Value>,
) -> ReelResult<TrackDescriptor> {
    let row: serde_json::Map<String, serde_json::Value> = row
        .into_iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v))
        .collect();

    let url = required_str(row_no, &row, "url")?;
    let title = required_str(row_no, &row, "title")?;
    let crop_start = optional_secs(row_no, &row, "crop_start")?;
    let crop_end = optional_secs(row_no, &row, "crop_end")?;

    Ok(TrackDescriptor {
        url,
        title,
        crop_start,
        crop_end,
    })
}

fn required_str(
    row_no: usize,
    row: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> ReelResult<String> {
    match row.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_json::Value::Null) | None => Err(ReelError::config(format!(
            "playlist row {row_no}: missing required column '{key}'"
        ))),
        Some(other) => Err(ReelError::config(format!(
            "playlist row {row_no}: column '{key}' must be a string, got {other}"
        ))),
    }
}

fn optional_secs(
    row_no: usize,
    row: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> ReelResult<u64> {
    let invalid = || {
        ReelError::config(format!(
            "playlist row {row_no}: '{key}' must be a non-negative whole number of seconds"
        ))
    };
    match row.get(key) {
        None | Some(serde_json::Value::Null) => Ok(0),
        Some(serde_json::Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                return Ok(v);
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
                _ => Err(invalid()),
            }
        }
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
#[path = "../tests/unit/playlist.rs"]
mod tests;
