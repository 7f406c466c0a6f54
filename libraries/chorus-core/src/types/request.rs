/// Playback request types
use super::{SessionId, TrackDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of reference a request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// One track (direct link or free-text search)
    #[default]
    Single,

    /// A video-site playlist
    Playlist,

    /// A music catalog playlist whose entries must be matched to playable tracks
    CatalogPlaylist,
}

impl RequestKind {
    /// Whether entries may fail independently
    pub fn is_multi(self) -> bool {
        !matches!(self, Self::Single)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Playlist => write!(f, "playlist"),
            Self::CatalogPlaylist => write!(f, "catalog playlist"),
        }
    }
}

/// Where status updates for a request should go
///
/// Opaque to the orchestrator; the status sink interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplyContext {
    /// Text channel (or any addressable destination) for updates
    pub channel: String,

    /// Who issued the command
    #[serde(default)]
    pub requested_by: Option<String>,
}

impl ReplyContext {
    /// Create a context for a channel
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            requested_by: None,
        }
    }

    /// Record who issued the command
    #[must_use]
    pub fn requested_by(mut self, user: impl Into<String>) -> Self {
        self.requested_by = Some(user.into());
        self
    }
}

/// A user's request to play something in a session
///
/// Consumed exactly once by a resolution worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackRequest {
    /// Target session
    pub session: SessionId,

    /// Raw reference: a URL or free-text search
    pub reference: String,

    /// Reference kind, set at enqueue time
    pub kind: RequestKind,

    /// Where to report progress
    pub context: ReplyContext,
}

impl PlaybackRequest {
    /// Whether the reference needs free-text interpretation before resolution
    ///
    /// Catalog playlists always go to the catalog resolver as given.
    pub fn needs_interpretation(&self) -> bool {
        self.kind != RequestKind::CatalogPlaylist && !is_url_reference(&self.reference)
    }
}

/// Whether a reference looks like a URL or URI rather than search text
///
/// Accepts hierarchical URLs (`scheme://...`) and opaque URIs with at least
/// two non-empty segments after the scheme (`spotify:track:<id>`). A single
/// `word:word` pair stays search text.
pub fn is_url_reference(reference: &str) -> bool {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return false;
    }

    let Some((scheme, rest)) = trimmed.split_once(':') else {
        return false;
    };
    if !is_scheme(scheme) {
        return false;
    }

    match rest.strip_prefix("//") {
        Some(authority) => !authority.is_empty(),
        None => rest.contains(':') && rest.split(':').all(|segment| !segment.is_empty()),
    }
}

fn is_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Outcome of resolving one reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved tracks in resolver order
    pub tracks: Vec<TrackDescriptor>,

    /// Playlist or catalog entries that failed individually
    pub skipped: usize,
}

impl Resolution {
    /// A resolution of exactly one track
    pub fn single(track: TrackDescriptor) -> Self {
        Self {
            tracks: vec![track],
            skipped: 0,
        }
    }

    /// Whether some entries were dropped
    pub fn is_partial(&self) -> bool {
        self.skipped > 0
    }
}
