/// Shared application state
use crate::config::ServerConfig;
use crate::error::Result;
use crate::services::{
    CatalogResolver, ClockDriverFactory, RecentStatusSink, RoutingResolver, YtDlpResolver,
};
use chorus_playback::{Collaborators, Orchestrator};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub notifications: Arc<RecentStatusSink>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, notifications: Arc<RecentStatusSink>) -> Self {
        Self {
            orchestrator,
            notifications,
        }
    }

    /// Wire the production collaborators and start the orchestrator
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let runtime = Handle::current();

        let ytdlp = Arc::new(YtDlpResolver::new(
            config.resolver.ytdlp_path.clone(),
            config.resolver.format.clone(),
        )
        .with_timeout(config.playback.resolve_timeout()));
        let catalog = Arc::new(CatalogResolver::new(
            &config.catalog,
            ytdlp.clone(),
            ytdlp.clone(),
        )?);
        let resolver = Arc::new(RoutingResolver::new(ytdlp.clone(), catalog));

        let notifications = Arc::new(RecentStatusSink::new(
            config.notifications.keep_per_channel,
        ));
        let drivers = Arc::new(ClockDriverFactory::new(
            runtime.clone(),
            config.driver.unknown_length(),
        ));

        let orchestrator = Orchestrator::start_on(
            &config.playback,
            Collaborators {
                resolver,
                interpreter: ytdlp,
                drivers,
                sink: notifications.clone(),
            },
            &runtime,
        );

        Ok(Self::new(Arc::new(orchestrator), notifications))
    }
}
