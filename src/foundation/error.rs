use std::time::Duration;

/// Convenience result type used across playreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Malformed or missing style, playlist or run configuration fields.
    #[error("config error: {0}")]
    Config(String),

    /// The audio fetch collaborator failed for a track.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Frame synthesis, image decoding or encoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// Audio timeline assembly rejected its input.
    #[error("timeline error: {0}")]
    Timeline(String),

    /// Artifact cache bookkeeping failed.
    #[error("cache error: {0}")]
    Cache(String),

    /// A track worker did not report back within its deadline.
    #[error("track worker timed out after {0:?}")]
    WorkerTimeout(Duration),

    /// A track worker terminated without producing a result.
    #[error("track worker crashed: {0}")]
    WorkerCrashed(String),

    /// Work was abandoned because its cancellation token was tripped.
    #[error("cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ReelError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Timeline`] value.
    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline(msg.into())
    }

    /// Build a [`ReelError::Cache`] value.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// `true` for failures raised by the worker supervisor rather than by the track pipeline.
    pub fn is_worker_failure(&self) -> bool {
        matches!(
            self,
            Self::WorkerTimeout(_) | Self::WorkerCrashed(_) | Self::Cancelled
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
