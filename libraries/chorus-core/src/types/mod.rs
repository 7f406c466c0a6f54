//! Domain types for Chorus

mod ids;
mod playback;
mod request;
mod track;

pub use ids::{EntryId, PlayToken, SessionId};
pub use playback::{ControlAction, ControlOutcome, DriverStatus, PlaybackOutcome, StatusUpdate};
pub use request::{is_url_reference, PlaybackRequest, ReplyContext, RequestKind, Resolution};
pub use track::{format_duration, TrackDescriptor};
