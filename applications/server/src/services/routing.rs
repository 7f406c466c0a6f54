/// Routes each reference to the resolver that understands it
use super::catalog::parse_catalog_link;
use async_trait::async_trait;
use chorus_core::{RequestKind, Resolution, Result, TrackResolver};
use std::sync::Arc;

pub struct RoutingResolver {
    video: Arc<dyn TrackResolver>,
    catalog: Arc<dyn TrackResolver>,
}

impl RoutingResolver {
    pub fn new(video: Arc<dyn TrackResolver>, catalog: Arc<dyn TrackResolver>) -> Self {
        Self { video, catalog }
    }
}

#[async_trait]
impl TrackResolver for RoutingResolver {
    async fn resolve(&self, reference: &str, kind: RequestKind) -> Result<Resolution> {
        if kind == RequestKind::CatalogPlaylist || parse_catalog_link(reference).is_some() {
            tracing::debug!(%reference, "resolving through catalog");
            return self.catalog.resolve(reference, kind).await;
        }
        self.video.resolve(reference, kind).await
    }
}
