//! Playback sequencer - per-session orchestration
//!
//! A [`Session`] pairs the session's [`SessionState`] with its playback
//! driver. Every state transition happens while holding the session mutex,
//! and every driver call is made under the same lock, so control actions,
//! resolution workers, and completion callbacks for one session are
//! serialized without touching other sessions.
//!
//! Starting playback has exactly one entry point, [`Session::advance_locked`].
//! Skip and previous only stop the driver; the completion callback then
//! advances through the ordinary path.

use crate::events::{EventBus, PlaybackEvent};
use crate::session::SessionState;
use crate::types::{QueueEntry, SessionSnapshot};
use chorus_core::{
    CompletionCallback, DriverStatus, PlayToken, PlaybackDriver, PlaybackOutcome, SessionId,
    StatusSink, StatusUpdate,
};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Collaborators shared by every session
pub(crate) struct SessionShared {
    pub(crate) sink: Arc<dyn StatusSink>,
    pub(crate) events: EventBus,
    /// Runtime that completion callbacks are marshaled onto
    pub(crate) runtime: Handle,
}

/// One playback session: state, driver, and the lock that serializes them
pub struct Session {
    id: SessionId,
    state: Mutex<SessionState>,
    driver: Arc<dyn PlaybackDriver>,
    shared: Arc<SessionShared>,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        history_size: usize,
        driver: Arc<dyn PlaybackDriver>,
        shared: Arc<SessionShared>,
    ) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState::new(history_size)),
            driver,
            shared,
        }
    }

    /// Session identifier
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Current driver status
    pub fn status(&self) -> DriverStatus {
        self.driver.status()
    }

    /// Lock the session state
    ///
    /// Holding the guard blocks every transition of this session.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    pub(crate) fn driver(&self) -> &dyn PlaybackDriver {
        self.driver.as_ref()
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Read-only copy of the session
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        state.snapshot(&self.id, self.driver.status())
    }

    /// Check invariants under the session lock
    ///
    /// # Errors
    /// Returns a description of the first violation found
    pub async fn verify(&self) -> Result<(), String> {
        let state = self.state.lock().await;
        state.verify(self.driver.status())
    }

    /// Append resolved entries and start playback if the session is idle
    ///
    /// Entries keep their order. Returns `true` if a track was started.
    pub async fn enqueue(self: &Arc<Self>, entries: Vec<QueueEntry>) -> bool {
        let mut state = self.state.lock().await;
        let count = entries.len();
        state.enqueue(entries);
        debug!(session = %self.id, count, pending = state.pending().len(), "entries appended");
        self.emit_queue_changed(&state);

        self.advance_locked(&mut state)
    }

    /// Start the next pending track if nothing is playing
    ///
    /// Returns `true` if a track was started.
    pub async fn advance(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock().await;
        self.advance_locked(&mut state)
    }

    /// Start the next pending track; caller holds the session lock
    ///
    /// No-op while a play attempt is in flight or the driver is active. A
    /// track the driver refuses is treated as finished with an error and the
    /// next one is tried.
    pub(crate) fn advance_locked(self: &Arc<Self>, state: &mut SessionState) -> bool {
        if let Some(token) = state.in_flight() {
            debug!(session = %self.id, %token, "advance ignored: play attempt in flight");
            return false;
        }
        if self.driver.status().is_active() {
            debug!(session = %self.id, "advance ignored: driver is active");
            return false;
        }

        loop {
            let Some((token, entry)) = state.begin_next() else {
                if let Some(context) = state.take_finished_context() {
                    info!(session = %self.id, "queue finished");
                    self.shared.sink.notify(&context, StatusUpdate::QueueFinished);
                    self.shared.events.emit(PlaybackEvent::StateChanged {
                        session: self.id.clone(),
                        status: DriverStatus::Idle,
                    });
                }
                return false;
            };

            let callback = self.completion_callback(token);
            match self.driver.play(&entry.track, callback) {
                Ok(()) => {
                    info!(
                        session = %self.id,
                        %token,
                        entry = %entry.id,
                        title = %entry.title(),
                        "track started"
                    );
                    self.shared.events.emit(PlaybackEvent::TrackStarted {
                        session: self.id.clone(),
                        entry: entry.id,
                        title: entry.title().to_string(),
                    });
                    self.shared.events.emit(PlaybackEvent::StateChanged {
                        session: self.id.clone(),
                        status: DriverStatus::Playing,
                    });
                    self.emit_queue_changed(state);
                    self.shared.sink.notify(
                        &entry.context,
                        StatusUpdate::NowPlaying {
                            track: Arc::clone(&entry.track),
                        },
                    );
                    return true;
                }
                Err(err) => {
                    warn!(
                        session = %self.id,
                        entry = %entry.id,
                        title = %entry.title(),
                        error = %err,
                        "driver refused track, skipping"
                    );
                    self.shared.sink.notify(
                        &entry.context,
                        StatusUpdate::PlaybackFailed {
                            title: entry.title().to_string(),
                            reason: err.to_string(),
                        },
                    );
                    state.retire_current();
                    state.clear_in_flight();
                    self.shared.events.emit(PlaybackEvent::TrackFinished {
                        session: self.id.clone(),
                        entry: entry.id,
                        outcome: PlaybackOutcome::Failed(err.to_string()),
                    });
                }
            }
        }
    }

    /// Handle the end of a play attempt
    ///
    /// Stale tokens (attempts invalidated by stop, clear, or a newer play)
    /// are ignored. Errors are logged and treated as a finished track.
    pub async fn complete(self: &Arc<Self>, token: PlayToken, outcome: PlaybackOutcome) {
        let mut state = self.state.lock().await;

        if !state.is_in_flight(token) {
            debug!(session = %self.id, %token, ?outcome, "stale completion ignored");
            return;
        }

        if let PlaybackOutcome::Failed(reason) = &outcome {
            warn!(session = %self.id, %token, %reason, "playback failed mid-track");
            if let Some(current) = state.current() {
                self.shared.sink.notify(
                    &current.context,
                    StatusUpdate::PlaybackFailed {
                        title: current.title().to_string(),
                        reason: reason.clone(),
                    },
                );
            }
        }

        state.clear_in_flight();
        if let Some(entry) = state.retire_current() {
            debug!(session = %self.id, %token, %entry, ?outcome, "track finished");
            self.shared.events.emit(PlaybackEvent::TrackFinished {
                session: self.id.clone(),
                entry,
                outcome,
            });
        }

        self.advance_locked(&mut state);
    }

    /// Callback for the driver, bound to this session and play attempt
    ///
    /// The driver may call it from any thread; it only schedules
    /// [`complete`](Self::complete) onto the runtime.
    fn completion_callback(self: &Arc<Self>, token: PlayToken) -> CompletionCallback {
        let session: Weak<Session> = Arc::downgrade(self);
        let runtime = self.shared.runtime.clone();
        Box::new(move |outcome| {
            runtime.spawn(async move {
                if let Some(session) = session.upgrade() {
                    session.complete(token, outcome).await;
                }
            });
        })
    }

    pub(crate) fn emit_queue_changed(&self, state: &SessionState) {
        self.shared.events.emit(PlaybackEvent::QueueChanged {
            session: self.id.clone(),
            pending: state.pending().len(),
        });
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("status", &self.driver.status())
            .finish_non_exhaustive()
    }
}
