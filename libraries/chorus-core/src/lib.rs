//! Chorus Core
//!
//! Domain types, collaborator traits, and error handling shared by the Chorus
//! playback orchestrator and the services that host it.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackDescriptor`, `PlaybackRequest`, `SessionId`, etc.
//! - **Collaborator Traits**: `TrackResolver`, `FreeTextInterpreter`,
//!   `PlaybackDriver`, `DriverFactory`, `StatusSink`
//! - **Error Handling**: Unified `ChorusError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use chorus_core::{PlaybackRequest, ReplyContext, RequestKind, SessionId};
//!
//! let request = PlaybackRequest {
//!     session: SessionId::new("guild-1:voice-1"),
//!     reference: "lofi hip hop".to_string(),
//!     kind: RequestKind::Single,
//!     context: ReplyContext::new("music-text").requested_by("alice"),
//! };
//!
//! assert!(request.needs_interpretation());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{ChorusError, Result};
pub use traits::{
    CompletionCallback, DriverFactory, FreeTextInterpreter, NullSink, PlaybackDriver,
    StatusSink, TrackResolver,
};
pub use types::{
    format_duration, is_url_reference, ControlAction, ControlOutcome, DriverStatus, EntryId,
    PlayToken, PlaybackOutcome, PlaybackRequest, ReplyContext, RequestKind, Resolution,
    SessionId, StatusUpdate, TrackDescriptor,
};
