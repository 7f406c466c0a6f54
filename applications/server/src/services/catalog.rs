/// Catalog resolver - Spotify Web API client
///
/// Catalog tracks carry no playable stream. Each one is turned into a
/// `"<title> <artist>"` search, interpreted into a video link, and resolved
/// as a single track.
use crate::config::CatalogSettings;
use crate::error::ServerError;
use async_trait::async_trait;
use chorus_core::{
    ChorusError, FreeTextInterpreter, RequestKind, Resolution, Result, TrackDescriptor,
    TrackResolver,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Refresh tokens this long before they expire
const TOKEN_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the granted one does not fit an `Instant`
const FALLBACK_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// A catalog link the resolver understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLink {
    Track(String),
    Playlist(String),
}

pub struct CatalogResolver {
    http: Client,
    api_url: String,
    auth_url: String,
    credentials: Option<(String, String)>,
    token: Mutex<Option<AccessToken>>,
    interpreter: Arc<dyn FreeTextInterpreter>,
    tracks: Arc<dyn TrackResolver>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct CatalogTrack {
    name: String,
    #[serde(default)]
    artists: Vec<CatalogArtist>,
}

#[derive(Debug, Deserialize)]
struct CatalogArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<CatalogTrack>,
}

impl CatalogTrack {
    /// Search text used to find a playable match
    fn query(&self) -> String {
        match self.artists.first() {
            Some(artist) => format!("{} {}", self.name, artist.name),
            None => self.name.clone(),
        }
    }
}

impl CatalogResolver {
    pub fn new(
        settings: &CatalogSettings,
        interpreter: Arc<dyn FreeTextInterpreter>,
        tracks: Arc<dyn TrackResolver>,
    ) -> crate::error::Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Chorus/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServerError::Internal(format!("failed to build HTTP client: {e}")))?;

        let credentials = settings.credentials();
        if credentials.is_none() {
            info!("catalog credentials not configured, catalog links will be refused");
        }

        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            auth_url: settings.auth_url.clone(),
            credentials,
            token: Mutex::new(None),
            interpreter,
            tracks,
        })
    }

    /// Bearer token, fetched with client credentials when missing or stale
    async fn bearer(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref() {
            if current.expires_at > Instant::now() + TOKEN_MARGIN {
                return Ok(current.value.clone());
            }
        }

        let (client_id, client_secret) = self
            .credentials
            .as_ref()
            .ok_or_else(|| ChorusError::resolution("catalog credentials are not configured"))?;

        debug!("requesting catalog access token");
        let response = self
            .http
            .post(&self.auth_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ChorusError::resolution(format!("catalog authentication failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChorusError::resolution(format!(
                "catalog authentication failed ({status})"
            )));
        }

        let granted: TokenResponse = response
            .json()
            .await
            .map_err(|e| ChorusError::resolution(format!("unreadable token response: {e}")))?;

        let value = granted.access_token.clone();
        *token = Some(AccessToken {
            value: granted.access_token,
            expires_at: token_deadline(Instant::now(), granted.expires_in),
        });
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let bearer = self.bearer().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| ChorusError::resolution(format!("catalog request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.token.lock().await.take();
        }
        if !status.is_success() {
            return Err(ChorusError::resolution(format!(
                "catalog returned {status} for {url}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChorusError::resolution(format!("unreadable catalog response: {e}")))
    }

    /// Search queries for every track of a playlist, plus unusable items
    async fn playlist_queries(&self, id: &str) -> Result<(Vec<String>, usize)> {
        let mut queries = Vec::new();
        let mut skipped = 0;
        let mut next = Some(format!("{}/playlists/{id}/tracks?limit=100", self.api_url));

        while let Some(url) = next {
            let page: PlaylistPage = self.get(&url).await?;
            for item in page.items {
                match item.track {
                    Some(track) => queries.push(track.query()),
                    None => skipped += 1,
                }
            }
            next = page.next;
        }

        debug!(playlist = %id, tracks = queries.len(), skipped, "catalog playlist listed");
        Ok((queries, skipped))
    }

    /// Find and resolve a playable match for a search query
    async fn match_query(&self, query: &str) -> Result<TrackDescriptor> {
        let url = self.interpreter.interpret(query).await?;
        let resolution = self.tracks.resolve(&url, RequestKind::Single).await?;
        resolution
            .tracks
            .into_iter()
            .next()
            .ok_or_else(|| ChorusError::no_match(query))
    }
}

#[async_trait]
impl TrackResolver for CatalogResolver {
    async fn resolve(&self, reference: &str, _kind: RequestKind) -> Result<Resolution> {
        let link = parse_catalog_link(reference)
            .ok_or_else(|| ChorusError::resolution(format!("not a catalog link: {reference}")))?;

        match link {
            CatalogLink::Track(id) => {
                let track: CatalogTrack = self.get(&format!("{}/tracks/{id}", self.api_url)).await?;
                Ok(Resolution::single(self.match_query(&track.query()).await?))
            }
            CatalogLink::Playlist(id) => {
                let (queries, mut skipped) = self.playlist_queries(&id).await?;
                let mut tracks = Vec::with_capacity(queries.len());

                for (index, query) in queries.iter().enumerate() {
                    match self.match_query(query).await {
                        Ok(track) => tracks.push(track),
                        Err(e) => {
                            warn!(playlist = %id, index, %query, error = %e, "no playable match, skipping");
                            skipped += 1;
                        }
                    }
                }

                Ok(Resolution { tracks, skipped })
            }
        }
    }
}

/// Recognize catalog track and playlist links
///
/// Accepts web links (with or without a locale segment such as
/// `intl-de`) and `spotify:` URIs.
pub fn parse_catalog_link(reference: &str) -> Option<CatalogLink> {
    let reference = reference.trim();

    if let Some(uri) = reference.strip_prefix("spotify:") {
        let mut parts = uri.split(':');
        return link_from(parts.next()?, parts.next()?);
    }

    let url = url::Url::parse(reference).ok()?;
    let host = url.host_str()?;
    if host != "spotify.com" && !host.ends_with(".spotify.com") {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    segments
        .windows(2)
        .find_map(|pair| link_from(pair[0], pair[1]))
}

fn token_deadline(now: Instant, expires_in: u64) -> Instant {
    now.checked_add(Duration::from_secs(expires_in))
        .unwrap_or(now + FALLBACK_TOKEN_LIFETIME)
}

fn link_from(kind: &str, id: &str) -> Option<CatalogLink> {
    if id.is_empty() {
        return None;
    }
    match kind {
        "track" => Some(CatalogLink::Track(id.to_string())),
        "playlist" => Some(CatalogLink::Playlist(id.to_string())),
        _ => None,
    }
}
