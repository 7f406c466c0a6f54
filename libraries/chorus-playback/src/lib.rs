//! Chorus Playback - Queue Orchestration
//!
//! Per-session playback queues for voice channels.
//!
//! This crate provides:
//! - Request intake with session-sticky resolution lanes
//! - Resolution pipeline (free-text interpretation, timeout, URL cache)
//! - Per-session sequencer (pending queue, current track, bounded history)
//! - Control actions (skip, pause, resume, stop, previous, clear)
//! - Playback event stream
//!
//! # Architecture
//!
//! `chorus-playback` knows nothing about any chat platform, media site, or
//! audio transport. Resolution, playback, and status messages are provided
//! via the traits in `chorus-core`.
//!
//! Every session owns its state behind its own lock. Control actions,
//! resolution workers, and driver completion callbacks for a session are
//! serialized through that lock; different sessions never contend.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use chorus_core::{
//!     ChorusError, ControlAction, FreeTextInterpreter, NullSink, PlaybackDriver,
//!     ReplyContext, RequestKind, Resolution, Result, SessionId, TrackDescriptor,
//!     TrackResolver,
//! };
//! use chorus_playback::{Collaborators, Orchestrator, PlaybackConfig};
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl TrackResolver for Echo {
//!     async fn resolve(&self, reference: &str, _kind: RequestKind) -> Result<Resolution> {
//!         Ok(Resolution::single(TrackDescriptor::new(reference, reference, reference)))
//!     }
//! }
//!
//! #[async_trait]
//! impl FreeTextInterpreter for Echo {
//!     async fn interpret(&self, query: &str) -> Result<String> {
//!         Err(ChorusError::no_match(query))
//!     }
//! }
//!
//! # fn my_driver() -> Arc<dyn PlaybackDriver> { unimplemented!() }
//! # async fn run() -> Result<()> {
//! let orchestrator = Orchestrator::start(
//!     &PlaybackConfig::default(),
//!     Collaborators {
//!         resolver: Arc::new(Echo),
//!         interpreter: Arc::new(Echo),
//!         drivers: Arc::new(|_: &SessionId| my_driver()),
//!         sink: Arc::new(NullSink),
//!     },
//! );
//!
//! let session = SessionId::new("guild-1:voice-1");
//! orchestrator.submit_request(
//!     session.clone(),
//!     "https://example.com/watch?v=1",
//!     RequestKind::Single,
//!     ReplyContext::new("music-text"),
//! )?;
//!
//! orchestrator.control(&session, ControlAction::Pause).await;
//! let snapshot = orchestrator.inspect(&session).await;
//! println!("{} queued", snapshot.pending.len());
//! # Ok(())
//! # }
//! ```

mod control;
pub mod events;
mod history;
mod intake;
mod orchestrator;
mod queue;
mod registry;
mod resolve;
mod sequencer;
pub mod session;
pub mod types;

// Public exports
pub use events::{EventBus, PlaybackEvent};
pub use history::History;
pub use intake::IntakeQueue;
pub use orchestrator::{Collaborators, Orchestrator};
pub use queue::PendingQueue;
pub use registry::SessionRegistry;
pub use resolve::ResolutionPipeline;
pub use sequencer::Session;
pub use session::SessionState;
pub use types::{PlaybackConfig, QueueEntry, QueueStatus, SessionSnapshot};
