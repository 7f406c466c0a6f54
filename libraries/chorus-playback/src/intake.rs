//! Request intake and resolution workers
//!
//! Requests are routed to one of a fixed number of lanes by session, so two
//! requests for the same session are resolved in submission order while other
//! sessions proceed on other lanes. Each lane is an unbounded channel drained
//! by one worker task.

use crate::events::{EventBus, PlaybackEvent};
use crate::registry::SessionRegistry;
use crate::resolve::ResolutionPipeline;
use crate::types::QueueEntry;
use chorus_core::{ChorusError, PlaybackRequest, Result, SessionId, StatusSink, StatusUpdate};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything a worker needs to turn a request into queue entries
pub(crate) struct IntakeContext {
    pub(crate) pipeline: ResolutionPipeline,
    pub(crate) registry: Arc<SessionRegistry>,
    pub(crate) sink: Arc<dyn StatusSink>,
    pub(crate) events: EventBus,
}

/// Multi-lane FIFO of playback requests
pub struct IntakeQueue {
    lanes: Vec<mpsc::UnboundedSender<PlaybackRequest>>,
    pending: Arc<AtomicUsize>,
    shutdown: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl IntakeQueue {
    /// Spawn `workers` lanes on `runtime`
    ///
    /// At least one lane is always started.
    pub(crate) fn start(
        workers: usize,
        context: Arc<IntakeContext>,
        runtime: &Handle,
        shutdown: CancellationToken,
    ) -> Self {
        let pending = Arc::new(AtomicUsize::new(0));
        let mut lanes = Vec::new();
        let mut handles = Vec::new();

        for worker_id in 0..workers.max(1) {
            let (tx, rx) = mpsc::unbounded_channel();
            lanes.push(tx);
            handles.push(runtime.spawn(worker_loop(
                worker_id,
                rx,
                Arc::clone(&context),
                Arc::clone(&pending),
                shutdown.clone(),
            )));
        }

        info!(workers = lanes.len(), "resolution workers started");
        Self {
            lanes,
            pending,
            shutdown,
            workers: Mutex::new(handles),
        }
    }

    /// Append a request to its session's lane
    ///
    /// # Errors
    /// Returns `ShuttingDown` once [`shutdown`](Self::shutdown) was called.
    pub fn submit(&self, request: PlaybackRequest) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(ChorusError::ShuttingDown);
        }

        let lane = self.lane_for(&request.session);
        self.pending.fetch_add(1, Ordering::SeqCst);
        debug!(session = %request.session, lane, reference = %request.reference, "request queued");

        if self.lanes[lane].send(request).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(ChorusError::ShuttingDown);
        }
        Ok(())
    }

    /// Lane that serves a session
    pub fn lane_for(&self, session: &SessionId) -> usize {
        let mut hasher = DefaultHasher::new();
        session.hash(&mut hasher);
        (hasher.finish() % self.lanes.len() as u64) as usize
    }

    /// Number of lanes
    pub fn lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Requests submitted and not yet fully processed
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop accepting requests and wait for the workers to exit
    ///
    /// Workers finish the request they are processing. Requests still queued
    /// are failed with `ShuttingDown` on their reply context and no longer
    /// count as pending.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handles = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "resolution worker ended abnormally");
            }
        }
        info!("resolution workers stopped");
    }
}

impl std::fmt::Debug for IntakeQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeQueue")
            .field("lanes", &self.lanes.len())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

async fn worker_loop(
    worker_id: usize,
    mut requests: mpsc::UnboundedReceiver<PlaybackRequest>,
    context: Arc<IntakeContext>,
    pending: Arc<AtomicUsize>,
    shutdown: CancellationToken,
) {
    debug!(worker_id, "resolution worker started");
    loop {
        let request = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        process(worker_id, &context, request).await;
        pending.fetch_sub(1, Ordering::SeqCst);
    }

    // Refuse late sends, then fail whatever was already queued
    requests.close();
    let mut abandoned = 0;
    while let Ok(request) = requests.try_recv() {
        report_failure(&context, &request, &ChorusError::ShuttingDown);
        pending.fetch_sub(1, Ordering::SeqCst);
        abandoned += 1;
    }
    if abandoned > 0 {
        warn!(worker_id, abandoned, "queued requests abandoned at shutdown");
    }
    debug!(worker_id, "resolution worker exiting");
}

/// Tell the requester, and event subscribers, that a request went nowhere
fn report_failure(context: &IntakeContext, request: &PlaybackRequest, err: &ChorusError) {
    context.sink.notify(
        &request.context,
        StatusUpdate::RequestFailed {
            reference: request.reference.clone(),
            reason: err.to_string(),
        },
    );
    context.events.emit(PlaybackEvent::RequestFailed {
        session: request.session.clone(),
        reference: request.reference.clone(),
        reason: err.to_string(),
    });
}

/// Resolve one request and append its tracks to the session
///
/// Failures are reported to the request's reply context and never stop the
/// worker.
async fn process(worker_id: usize, context: &IntakeContext, request: PlaybackRequest) {
    let PlaybackRequest {
        session,
        reference,
        kind,
        context: reply,
    } = &request;

    info!(worker_id, %session, %reference, %kind, "processing request");
    context.sink.notify(
        reply,
        StatusUpdate::Received {
            reference: reference.clone(),
        },
    );

    let resolution = match context.pipeline.resolve(&request).await {
        Ok(resolution) => resolution,
        Err(err) => {
            error!(worker_id, %session, %reference, error = %err, "request failed");
            report_failure(context, &request, &err);
            return;
        }
    };

    let entries: Vec<QueueEntry> = resolution
        .tracks
        .into_iter()
        .map(|track| QueueEntry::new(track, reply.clone()))
        .collect();
    let added = entries.len();
    let title = match entries.as_slice() {
        [only] => Some(only.title().to_string()),
        _ => None,
    };

    let target = context.registry.get_or_create(session).await;
    context.sink.notify(
        reply,
        StatusUpdate::Added {
            added,
            skipped: resolution.skipped,
            title,
        },
    );
    target.enqueue(entries).await;

    context.events.emit(PlaybackEvent::RequestCompleted {
        session: session.clone(),
        added,
        skipped: resolution.skipped,
    });
}
