//! Core types for playback orchestration

use chorus_core::{DriverStatus, EntryId, ReplyContext, SessionId, TrackDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One resolved track placed into a session
///
/// An entry lives in exactly one of a session's containers (pending,
/// current, history) at a time; it moves between them, it is never copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Process-unique identity
    pub id: EntryId,

    /// The resolved track
    pub track: Arc<TrackDescriptor>,

    /// Where "now playing" notices for this track go
    pub context: ReplyContext,
}

impl QueueEntry {
    /// Wrap a resolved track with a fresh entry ID
    pub fn new(track: TrackDescriptor, context: ReplyContext) -> Self {
        Self {
            id: EntryId::next(),
            track: Arc::new(track),
            context,
        }
    }

    /// Track title
    pub fn title(&self) -> &str {
        &self.track.title
    }
}

/// Read-only copy of a session's state for status display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session the snapshot was taken from
    pub session: SessionId,

    /// Driver status at snapshot time
    pub status: DriverStatus,

    /// Track currently loaded in the driver
    pub current: Option<QueueEntry>,

    /// Tracks waiting to play (next first)
    pub pending: Vec<QueueEntry>,

    /// Recently played tracks (oldest first)
    pub history: Vec<QueueEntry>,
}

impl SessionSnapshot {
    /// Whether nothing is playing or queued
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    /// Total queued playback time, ignoring tracks of unknown length
    pub fn pending_duration(&self) -> Duration {
        self.pending
            .iter()
            .filter_map(|entry| entry.track.duration)
            .sum()
    }
}

/// Intake and registry counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Requests submitted but not yet resolved
    pub pending_requests: usize,

    /// Sessions created so far
    pub sessions: usize,
}

/// Configuration for playback orchestration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum history size per session (default: 50)
    pub history_size: usize,

    /// Number of session-sticky resolution lanes (default: 2)
    pub workers: usize,

    /// Upper bound on one collaborator call, in seconds (default: 60)
    ///
    /// Covers interpretation, a single-track resolution, and each playlist
    /// entry inside the resolvers.
    pub resolve_timeout_secs: u64,

    /// Upper bound on a whole playlist resolution, in seconds (default: 1800)
    pub playlist_timeout_secs: u64,

    /// Exact-URL resolution cache capacity, 0 disables (default: 256)
    pub resolver_cache_size: usize,

    /// How long a cached resolution stays valid, in seconds (default: 1800)
    pub resolver_cache_ttl_secs: u64,

    /// Buffered playback events per subscriber (default: 256)
    pub event_capacity: usize,
}

impl PlaybackConfig {
    /// Resolution timeout as a `Duration`
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    /// Playlist resolution timeout as a `Duration`
    pub fn playlist_timeout(&self) -> Duration {
        Duration::from_secs(self.playlist_timeout_secs)
    }

    /// Cache TTL as a `Duration`
    pub fn resolver_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.resolver_cache_ttl_secs)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            workers: 2,
            resolve_timeout_secs: 60,
            playlist_timeout_secs: 1800,
            resolver_cache_size: 256,
            resolver_cache_ttl_secs: 1800,
            event_capacity: 256,
        }
    }
}
