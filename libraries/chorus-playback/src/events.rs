//! Playback Events
//!
//! Broadcast notifications for observers (status pages, tests, metrics).
//! Events are emitted at key points:
//! - Track started / finished
//! - Pending queue changed
//! - Transport state changed (playing, paused, idle)
//! - Request resolved or failed

use chorus_core::{DriverStatus, EntryId, PlaybackOutcome, SessionId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// The driver accepted a track
    TrackStarted {
        /// Session
        session: SessionId,
        /// Entry now current
        entry: EntryId,
        /// Track title
        title: String,
    },

    /// A track left `current` (natural end, skip, stop, or failure)
    TrackFinished {
        /// Session
        session: SessionId,
        /// Entry moved to history
        entry: EntryId,
        /// How the attempt ended
        outcome: PlaybackOutcome,
    },

    /// Pending queue length changed
    QueueChanged {
        /// Session
        session: SessionId,
        /// New pending length
        pending: usize,
    },

    /// Transport state changed
    StateChanged {
        /// Session
        session: SessionId,
        /// New driver status
        status: DriverStatus,
    },

    /// A request was resolved and appended
    RequestCompleted {
        /// Session
        session: SessionId,
        /// Tracks appended
        added: usize,
        /// Entries skipped
        skipped: usize,
    },

    /// A request produced nothing playable
    RequestFailed {
        /// Session
        session: SessionId,
        /// The raw reference
        reference: String,
        /// Why it failed
        reason: String,
    },
}

impl PlaybackEvent {
    /// Session the event belongs to
    pub fn session(&self) -> &SessionId {
        match self {
            Self::TrackStarted { session, .. }
            | Self::TrackFinished { session, .. }
            | Self::QueueChanged { session, .. }
            | Self::StateChanged { session, .. }
            | Self::RequestCompleted { session, .. }
            | Self::RequestFailed { session, .. } => session,
        }
    }
}

/// Fan-out of playback events
///
/// Emitting never blocks and never fails; events are dropped when nobody
/// listens, and slow subscribers observe `Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlaybackEvent>,
}

impl EventBus {
    /// Create a bus buffering `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event
    pub fn emit(&self, event: PlaybackEvent) {
        tracing::trace!(?event, "playback event");
        let _ = self.sender.send(event);
    }

    /// Receive future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit(PlaybackEvent::QueueChanged {
            session: SessionId::new("s1"),
            pending: 3,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session().as_str(), "s1");
        assert!(matches!(event, PlaybackEvent::QueueChanged { pending: 3, .. }));
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = EventBus::new(1);
        bus.emit(PlaybackEvent::StateChanged {
            session: SessionId::new("s1"),
            status: DriverStatus::Idle,
        });
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = PlaybackEvent::TrackFinished {
            session: SessionId::new("s1"),
            entry: EntryId::next(),
            outcome: PlaybackOutcome::Stopped,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "track_finished");
        assert_eq!(json["session"], "s1");
    }
}
