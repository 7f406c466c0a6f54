//! Orchestrator facade
//!
//! Wires the intake lanes, resolution pipeline, and session registry together
//! and exposes the operations the hosting service calls.

use crate::events::{EventBus, PlaybackEvent};
use crate::intake::{IntakeContext, IntakeQueue};
use crate::registry::SessionRegistry;
use crate::resolve::ResolutionPipeline;
use crate::types::{PlaybackConfig, QueueStatus, SessionSnapshot};
use chorus_core::{
    ChorusError, ControlAction, ControlOutcome, DriverFactory, FreeTextInterpreter,
    PlaybackRequest, ReplyContext, RequestKind, Result, SessionId, StatusSink, TrackResolver,
};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// External collaborators the orchestrator drives
#[derive(Clone)]
pub struct Collaborators {
    /// URL reference to tracks
    pub resolver: Arc<dyn TrackResolver>,

    /// Free text to URL reference
    pub interpreter: Arc<dyn FreeTextInterpreter>,

    /// Creates one playback driver per session
    pub drivers: Arc<dyn DriverFactory>,

    /// User-facing progress messages
    pub sink: Arc<dyn StatusSink>,
}

/// Playback queue orchestrator
///
/// One instance serves every session of the process.
pub struct Orchestrator {
    registry: Arc<SessionRegistry>,
    intake: IntakeQueue,
    events: EventBus,
}

impl Orchestrator {
    /// Start the orchestrator on the current Tokio runtime
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn start(config: &PlaybackConfig, collaborators: Collaborators) -> Self {
        Self::start_on(config, collaborators, &Handle::current())
    }

    /// Start the orchestrator on an explicit runtime
    pub fn start_on(config: &PlaybackConfig, collaborators: Collaborators, runtime: &Handle) -> Self {
        let Collaborators {
            resolver,
            interpreter,
            drivers,
            sink,
        } = collaborators;

        let events = EventBus::new(config.event_capacity);
        let registry = Arc::new(SessionRegistry::new(
            config,
            drivers,
            Arc::clone(&sink),
            events.clone(),
            runtime.clone(),
        ));

        let context = Arc::new(IntakeContext {
            pipeline: ResolutionPipeline::new(config, resolver, interpreter),
            registry: Arc::clone(&registry),
            sink,
            events: events.clone(),
        });
        let intake = IntakeQueue::start(config.workers, context, runtime, CancellationToken::new());

        info!(
            workers = intake.lanes(),
            history_size = config.history_size,
            "playback orchestrator started"
        );

        Self {
            registry,
            intake,
            events,
        }
    }

    /// Queue a reference for resolution
    ///
    /// Returns as soon as the request is queued; progress is reported to the
    /// reply context and the event stream.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty reference, `ShuttingDown` after
    /// [`shutdown`](Self::shutdown).
    pub fn submit_request(
        &self,
        session: SessionId,
        reference: impl Into<String>,
        kind: RequestKind,
        context: ReplyContext,
    ) -> Result<()> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(ChorusError::InvalidRequest("empty reference".to_string()));
        }

        self.intake.submit(PlaybackRequest {
            session,
            reference,
            kind,
            context,
        })
    }

    /// Apply a control action to a session
    ///
    /// Actions on a session that has never been used are no-ops.
    pub async fn control(&self, session: &SessionId, action: ControlAction) -> ControlOutcome {
        match self.registry.get(session).await {
            Some(target) => target.control(action).await,
            None => {
                debug!(%session, %action, "control for unknown session");
                ControlOutcome::no_op("nothing is playing")
            }
        }
    }

    /// Snapshot a session, creating it if unseen
    pub async fn inspect(&self, session: &SessionId) -> SessionSnapshot {
        self.registry.snapshot(session).await
    }

    /// Clear a session's queue, history, and current track
    pub async fn reset(&self, session: &SessionId) -> ControlOutcome {
        self.registry.reset(session).await
    }

    /// Intake and registry counters
    pub fn queue_status(&self) -> QueueStatus {
        QueueStatus {
            pending_requests: self.intake.pending(),
            sessions: self.registry.created_count(),
        }
    }

    /// IDs of all known sessions, sorted
    pub async fn sessions(&self) -> Vec<SessionId> {
        self.registry.session_ids().await
    }

    /// Receive playback events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Session registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Lane that resolves requests for a session
    pub fn lane_for(&self, session: &SessionId) -> usize {
        self.intake.lane_for(session)
    }

    /// Stop accepting requests and wait for the resolution workers
    ///
    /// Sessions keep their state; drivers are not stopped.
    pub async fn shutdown(&self) {
        self.intake.shutdown().await;
        info!("playback orchestrator stopped");
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("intake", &self.intake)
            .finish_non_exhaustive()
    }
}
