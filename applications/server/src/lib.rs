//! Chorus Server Library
//!
//! HTTP control surface for the Chorus playback orchestrator, plus the
//! yt-dlp and catalog resolvers, the clock playback driver, and the status
//! sink it is wired with.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::{
    CatalogResolver, ClockDriverFactory, RecentStatusSink, RoutingResolver, YtDlpResolver,
};
pub use state::AppState;
