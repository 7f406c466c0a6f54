/// Core error types for Chorus
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `ChorusError`
pub type Result<T> = std::result::Result<T, ChorusError>;

/// Core error type for Chorus
#[derive(Error, Debug)]
pub enum ChorusError {
    /// The whole reference could not be resolved (removed content, region lock, auth)
    #[error("Resolution failed: {0}")]
    ResolutionFailed(String),

    /// Free-text interpretation produced no candidate
    #[error("No match for query: {0}")]
    NoMatch(String),

    /// Resolution did not finish within the configured timeout
    #[error("Resolution timed out after {0:?}")]
    ResolutionTimeout(Duration),

    /// The playback driver could not begin playing a track
    #[error("Playback start failed: {0}")]
    PlaybackStartFailed(String),

    /// Control action not applicable in the current state
    #[error("Invalid control: {0}")]
    InvalidControl(String),

    /// The request itself is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The orchestrator no longer accepts work
    #[error("Orchestrator is shutting down")]
    ShuttingDown,

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl ChorusError {
    /// Create a resolution failure
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::ResolutionFailed(msg.into())
    }

    /// Create a no-match error
    pub fn no_match(query: impl Into<String>) -> Self {
        Self::NoMatch(query.into())
    }

    /// Create a playback start failure
    pub fn playback_start(msg: impl Into<String>) -> Self {
        Self::PlaybackStartFailed(msg.into())
    }

    /// Whether this error came out of the resolution stage
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailed(_) | Self::NoMatch(_) | Self::ResolutionTimeout(_)
        )
    }
}
