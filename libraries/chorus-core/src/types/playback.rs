/// Playback status, outcomes, and status-update types
use super::TrackDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Transport status reported by a playback driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    /// Nothing loaded
    #[default]
    Idle,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

impl DriverStatus {
    /// Whether a track is loaded (playing or paused)
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// How a play attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum PlaybackOutcome {
    /// Reached the end of the track
    Finished,

    /// Stopped by a control action
    Stopped,

    /// Transport failed mid-track
    Failed(String),
}

impl PlaybackOutcome {
    /// Whether the attempt ended with an error
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A control action issued against a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    /// Stop the current track and advance
    Skip,
    /// Pause the current track
    Pause,
    /// Resume a paused track
    Resume,
    /// Clear pending tracks and stop
    Stop,
    /// Replay the most recently finished track
    Previous,
    /// Stop and forget pending tracks and history
    Clear,
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Skip => "skip",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Previous => "previous",
            Self::Clear => "clear",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for ControlAction {
    type Err = crate::ChorusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" | "next" => Ok(Self::Skip),
            "pause" => Ok(Self::Pause),
            "resume" | "play" => Ok(Self::Resume),
            "stop" => Ok(Self::Stop),
            "previous" | "prev" => Ok(Self::Previous),
            "clear" | "skip_all" => Ok(Self::Clear),
            other => Err(crate::ChorusError::InvalidControl(format!(
                "unknown action '{other}'"
            ))),
        }
    }
}

/// Result of a control action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum ControlOutcome {
    /// The action changed session state
    Applied,

    /// The action did not apply in the current state
    NoOp(String),
}

impl ControlOutcome {
    /// Create a no-op outcome
    pub fn no_op(reason: impl Into<String>) -> Self {
        Self::NoOp(reason.into())
    }

    /// Whether the action was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// A user-facing progress message sent to a request's reply context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The request was accepted and is waiting for resolution
    Received {
        /// The raw reference
        reference: String,
    },

    /// Tracks were appended to the session
    Added {
        /// Number of tracks appended
        added: usize,
        /// Entries that failed individually
        skipped: usize,
        /// Title of the track when exactly one was added
        title: Option<String>,
    },

    /// The request produced nothing playable
    RequestFailed {
        /// The raw reference
        reference: String,
        /// Why it failed
        reason: String,
    },

    /// A track started playing
    NowPlaying {
        /// The track
        track: Arc<TrackDescriptor>,
    },

    /// A track could not be played and was skipped
    PlaybackFailed {
        /// Title of the failed track
        title: String,
        /// Why it failed
        reason: String,
    },

    /// The session ran out of tracks
    QueueFinished,
}

impl fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received { reference } => {
                write!(f, "Request received, processing {reference}")
            }
            Self::Added {
                added: 1,
                skipped: 0,
                title: Some(title),
            } => write!(f, "Added to queue: {title}"),
            Self::Added { added, skipped, .. } if *skipped > 0 => {
                write!(f, "Added {added} track(s) to the queue, skipped {skipped}")
            }
            Self::Added { added, .. } => write!(f, "Added {added} track(s) to the queue"),
            Self::RequestFailed { reference, reason } => {
                write!(f, "Could not queue {reference}: {reason}")
            }
            Self::NowPlaying { track } => write!(
                f,
                "Now playing: {} [{}] <{}>",
                track.title,
                track.display_duration(),
                track.source_url
            ),
            Self::PlaybackFailed { title, reason } => {
                write!(f, "Could not play {title}, skipping: {reason}")
            }
            Self::QueueFinished => write!(f, "Queue is empty, playback stopped"),
        }
    }
}
