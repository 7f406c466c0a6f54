//! Session registry
//!
//! Process-wide map from session ID to [`Session`]. Keys are only ever added;
//! clearing a session resets its contents and keeps the entry.

use crate::events::EventBus;
use crate::sequencer::{Session, SessionShared};
use crate::types::{PlaybackConfig, SessionSnapshot};
use chorus_core::{ControlOutcome, DriverFactory, SessionId, StatusSink};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tracing::info;

/// Owner of every session's state
///
/// The map lock is held only to look up or insert an entry, never while a
/// session lock is held, so sessions do not contend with each other.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
    drivers: Arc<dyn DriverFactory>,
    shared: Arc<SessionShared>,
    history_size: usize,
    created: AtomicUsize,
}

impl SessionRegistry {
    /// Create an empty registry
    ///
    /// Completion callbacks of every session are marshaled onto `runtime`.
    pub fn new(
        config: &PlaybackConfig,
        drivers: Arc<dyn DriverFactory>,
        sink: Arc<dyn StatusSink>,
        events: EventBus,
        runtime: Handle,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            drivers,
            shared: Arc::new(SessionShared {
                sink,
                events,
                runtime,
            }),
            history_size: config.history_size,
            created: AtomicUsize::new(0),
        }
    }

    /// Get a session, creating it on first use
    ///
    /// Concurrent callers for the same unseen ID all receive the same
    /// instance; exactly one session (and one driver) is created.
    pub async fn get_or_create(&self, id: &SessionId) -> Arc<Session> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id.clone()).or_insert_with(|| {
            let driver = self.drivers.driver_for(id);
            let total = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            info!(session = %id, total, "session created");
            Arc::new(Session::new(
                id.clone(),
                self.history_size,
                driver,
                Arc::clone(&self.shared),
            ))
        });
        Arc::clone(session)
    }

    /// Get an existing session without creating it
    pub async fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Clear a session's pending queue, history, and current track
    ///
    /// Atomic with respect to the session's sequencer: any play attempt in
    /// flight is invalidated, so its completion cannot resurrect a track.
    pub async fn reset(&self, id: &SessionId) -> ControlOutcome {
        match self.get(id).await {
            Some(session) => session.reset().await,
            None => ControlOutcome::no_op("unknown session"),
        }
    }

    /// Snapshot a session, creating it if unseen
    pub async fn snapshot(&self, id: &SessionId) -> SessionSnapshot {
        self.get_or_create(id).await.snapshot().await
    }

    /// IDs of all known sessions, sorted
    pub async fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of sessions ever created
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("history_size", &self.history_size)
            .field("created", &self.created_count())
            .finish_non_exhaustive()
    }
}
