/// Collaborator traits consumed by the orchestrator
use crate::error::Result;
use crate::types::{
    DriverStatus, PlaybackOutcome, ReplyContext, RequestKind, Resolution, SessionId,
    StatusUpdate, TrackDescriptor,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a URL reference into playable track descriptors
///
/// Implementations may be slow and network-bound. For playlist and catalog
/// kinds, entries that fail individually are counted in
/// [`Resolution::skipped`]; the call as a whole fails with
/// [`ChorusError::ResolutionFailed`](crate::ChorusError::ResolutionFailed)
/// only when nothing resolves.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resolve a URL reference of the given kind
    async fn resolve(&self, reference: &str, kind: RequestKind) -> Result<Resolution>;
}

/// Turns free-text search into exactly one URL reference
#[async_trait]
pub trait FreeTextInterpreter: Send + Sync {
    /// Pick the best candidate URL for a query
    ///
    /// # Errors
    /// Returns `NoMatch` when nothing matches
    async fn interpret(&self, query: &str) -> Result<String>;
}

/// Called exactly once when a play attempt ends
///
/// May be invoked from any thread, including the driver's own transport thread.
pub type CompletionCallback = Box<dyn FnOnce(PlaybackOutcome) + Send + 'static>;

/// Audio transport for one session
///
/// All methods are called while the session lock is held, so they must
/// return promptly. Stopping a playing or paused track must eventually fire
/// that track's completion callback with [`PlaybackOutcome::Stopped`].
pub trait PlaybackDriver: Send + Sync {
    /// Start playing a track
    ///
    /// # Errors
    /// Returns `PlaybackStartFailed` if playback could not begin; the callback
    /// is dropped without being called in that case.
    fn play(&self, track: &TrackDescriptor, on_complete: CompletionCallback) -> Result<()>;

    /// Stop the current track
    fn stop(&self) -> DriverStatus;

    /// Pause the current track
    fn pause(&self) -> DriverStatus;

    /// Resume a paused track
    fn resume(&self) -> DriverStatus;

    /// Current transport status
    fn status(&self) -> DriverStatus;
}

/// Creates the playback driver for a session on first use
pub trait DriverFactory: Send + Sync {
    /// Driver bound to the given session
    fn driver_for(&self, session: &SessionId) -> Arc<dyn PlaybackDriver>;
}

impl<F> DriverFactory for F
where
    F: Fn(&SessionId) -> Arc<dyn PlaybackDriver> + Send + Sync,
{
    fn driver_for(&self, session: &SessionId) -> Arc<dyn PlaybackDriver> {
        self(session)
    }
}

/// Best-effort destination for user-facing status messages
///
/// Fire-and-forget: implementations must not block and must swallow their own
/// failures.
pub trait StatusSink: Send + Sync {
    /// Deliver an update to a reply context
    fn notify(&self, context: &ReplyContext, update: StatusUpdate);
}

/// Sink that drops every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn notify(&self, _context: &ReplyContext, _update: StatusUpdate) {}
}
