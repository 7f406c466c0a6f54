//! Resolution pipeline
//!
//! Free-text interpretation, resolution, and an exact-URL cache. Every
//! collaborator call runs under the per-call timeout, except playlist
//! resolutions which get the playlist timeout instead (their resolvers bound
//! each entry themselves). Only single-track URL references are cached; free
//! text is never a cache key, and playlists are never cached because their
//! contents change.

use crate::types::PlaybackConfig;
use chorus_core::{
    ChorusError, FreeTextInterpreter, PlaybackRequest, RequestKind, Resolution, Result,
    TrackDescriptor, TrackResolver,
};
use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Turns a playback request into resolved tracks
pub struct ResolutionPipeline {
    resolver: Arc<dyn TrackResolver>,
    interpreter: Arc<dyn FreeTextInterpreter>,
    cache: Option<Mutex<LruCache<String, CachedTrack>>>,
    cache_ttl: Duration,
    timeout: Duration,
    playlist_timeout: Duration,
}

#[derive(Debug, Clone)]
struct CachedTrack {
    track: TrackDescriptor,
    stored_at: Instant,
}

impl ResolutionPipeline {
    /// Create a pipeline from the configured limits
    pub fn new(
        config: &PlaybackConfig,
        resolver: Arc<dyn TrackResolver>,
        interpreter: Arc<dyn FreeTextInterpreter>,
    ) -> Self {
        let cache = NonZeroUsize::new(config.resolver_cache_size)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));

        Self {
            resolver,
            interpreter,
            cache,
            cache_ttl: config.resolver_cache_ttl(),
            timeout: config.resolve_timeout(),
            playlist_timeout: config.playlist_timeout(),
        }
    }

    /// Resolve a request, bounding each collaborator call
    ///
    /// # Errors
    /// `NoMatch` if free text matched nothing, `ResolutionFailed` if the
    /// reference (or every entry of it) is unplayable, `ResolutionTimeout`
    /// if a collaborator did not answer in time.
    pub async fn resolve(&self, request: &PlaybackRequest) -> Result<Resolution> {
        let raw = request.reference.trim();
        if raw.is_empty() {
            return Err(ChorusError::InvalidRequest("empty reference".to_string()));
        }

        let reference = if request.needs_interpretation() {
            let url = bounded(self.timeout, self.interpreter.interpret(raw)).await?;
            debug!(query = %raw, %url, "free text interpreted");
            url
        } else {
            raw.to_string()
        };

        let cacheable = request.kind == RequestKind::Single;
        if cacheable {
            if let Some(track) = self.cached(&reference) {
                debug!(%reference, "resolution cache hit");
                return Ok(Resolution::single(track));
            }
        }

        let limit = if request.kind.is_multi() {
            self.playlist_timeout
        } else {
            self.timeout
        };
        let resolution = bounded(limit, self.resolver.resolve(&reference, request.kind)).await?;
        if resolution.tracks.is_empty() {
            return Err(ChorusError::resolution(format!(
                "nothing playable at {reference} ({} entries skipped)",
                resolution.skipped
            )));
        }

        info!(
            %reference,
            kind = %request.kind,
            tracks = resolution.tracks.len(),
            skipped = resolution.skipped,
            "reference resolved"
        );

        if cacheable && resolution.tracks.len() == 1 {
            self.store(reference, &resolution.tracks[0]);
        }
        Ok(resolution)
    }

    fn cached(&self, reference: &str) -> Option<TrackDescriptor> {
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);

        let fresh = cache
            .get(reference)
            .is_some_and(|hit| hit.stored_at.elapsed() < self.cache_ttl);
        if !fresh {
            cache.pop(reference);
            return None;
        }
        cache.get(reference).map(|hit| hit.track.clone())
    }

    fn store(&self, reference: String, track: &TrackDescriptor) {
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.put(
                reference,
                CachedTrack {
                    track: track.clone(),
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Number of cached references
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| {
            cache.lock().unwrap_or_else(PoisonError::into_inner).len()
        })
    }
}

async fn bounded<T>(limit: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ChorusError::ResolutionTimeout(limit)))
}
