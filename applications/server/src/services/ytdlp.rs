/// yt-dlp resolver - resolves video-site links and searches by shelling out
/// to `yt-dlp -J`
use async_trait::async_trait;
use chorus_core::{
    ChorusError, FreeTextInterpreter, RequestKind, Resolution, Result, TrackDescriptor,
    TrackResolver,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default bound on one yt-dlp invocation
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Entries yt-dlp lists but cannot play
const UNAVAILABLE_TITLES: &[&str] = &["[Private video]", "[Deleted video]"];
const UNAVAILABLE_MARKERS: &[&str] = &["private", "premium_only", "subscriber_only", "needs_auth"];

#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: PathBuf,
    format: String,
    call_timeout: Duration,
}

/// The subset of yt-dlp's info JSON we read
#[derive(Debug, Default, Deserialize)]
pub(crate) struct VideoInfo {
    pub title: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub availability: Option<String>,
    pub entries: Option<Vec<Option<VideoInfo>>>,
}

impl YtDlpResolver {
    pub fn new(binary: PathBuf, format: impl Into<String>) -> Self {
        Self {
            binary,
            format: format.into(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Bound each yt-dlp invocation; a hung playlist entry is skipped
    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Run yt-dlp and parse its JSON dump
    async fn dump(&self, args: &[&str]) -> Result<VideoInfo> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-J")
            .arg("--no-warnings")
            .arg("--no-cache-dir")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // kill_on_drop reaps the child when the timeout drops it
        let output = tokio::time::timeout(self.call_timeout, cmd.output())
            .await
            .map_err(|_| ChorusError::ResolutionTimeout(self.call_timeout))?
            .map_err(|e| {
                ChorusError::resolution(format!("failed to run {}: {e}", self.binary.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("yt-dlp exited with an error")
                .trim()
                .to_string();
            return Err(ChorusError::resolution(reason));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ChorusError::resolution(format!("unreadable yt-dlp output: {e}")))
    }

    async fn resolve_single(&self, url: &str) -> Result<TrackDescriptor> {
        let info = self
            .dump(&["--no-playlist", "-f", self.format.as_str(), url])
            .await?;
        track_from_info(info, url)
    }

    async fn resolve_playlist(&self, url: &str) -> Result<Resolution> {
        let info = self.dump(&["--flat-playlist", url]).await?;
        let (urls, mut skipped) = playlist_urls(info);
        if urls.is_empty() && skipped == 0 {
            return Err(ChorusError::resolution("no videos found in playlist"));
        }

        let mut tracks = Vec::with_capacity(urls.len());
        for (index, entry_url) in urls.iter().enumerate() {
            match self.resolve_single(entry_url).await {
                Ok(track) => tracks.push(track),
                Err(e) => {
                    tracing::warn!(playlist = %url, index, entry = %entry_url, error = %e, "skipping playlist entry");
                    skipped += 1;
                }
            }
        }

        Ok(Resolution { tracks, skipped })
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, reference: &str, kind: RequestKind) -> Result<Resolution> {
        match kind {
            RequestKind::Single => Ok(Resolution::single(self.resolve_single(reference).await?)),
            RequestKind::Playlist => self.resolve_playlist(reference).await,
            RequestKind::CatalogPlaylist => Err(ChorusError::resolution(
                "catalog playlists cannot be resolved by yt-dlp",
            )),
        }
    }
}

#[async_trait]
impl FreeTextInterpreter for YtDlpResolver {
    async fn interpret(&self, query: &str) -> Result<String> {
        let search = format!("ytsearch1:{query}");
        let info = self.dump(&["--flat-playlist", search.as_str()]).await?;

        playlist_urls(info)
            .0
            .into_iter()
            .next()
            .ok_or_else(|| ChorusError::no_match(query))
    }
}

/// Build a descriptor from a single-video dump
///
/// A dump with entries (a link that still pointed at a list) yields its
/// first entry.
pub(crate) fn track_from_info(mut info: VideoInfo, reference: &str) -> Result<TrackDescriptor> {
    if let Some(entries) = info.entries.take() {
        info = entries
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| ChorusError::resolution("no videos found"))?;
    }

    let playable = info
        .url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ChorusError::resolution(format!("no audio stream for {reference}")))?;

    let mut track = TrackDescriptor::new(
        info.title.unwrap_or_else(|| "Unknown title".to_string()),
        playable,
        info.webpage_url.unwrap_or_else(|| reference.to_string()),
    );
    if let Some(secs) = info.duration.filter(|d| d.is_finite() && *d >= 0.0) {
        track = track.with_duration(Duration::from_secs_f64(secs));
    }
    if let Some(thumbnail) = info.thumbnail {
        track = track.with_thumbnail(thumbnail);
    }
    if let Some(uploader) = info.uploader {
        track = track.with_uploader(uploader);
    }
    Ok(track)
}

/// Page URLs of a flat playlist dump, plus the number of unusable entries
pub(crate) fn playlist_urls(info: VideoInfo) -> (Vec<String>, usize) {
    let mut urls = Vec::new();
    let mut skipped = 0;

    for entry in info.entries.unwrap_or_default() {
        let Some(entry) = entry else {
            skipped += 1;
            continue;
        };

        let unavailable = entry
            .title
            .as_deref()
            .is_some_and(|title| UNAVAILABLE_TITLES.contains(&title))
            || entry
                .availability
                .as_deref()
                .is_some_and(|a| UNAVAILABLE_MARKERS.contains(&a));

        match entry.webpage_url.or(entry.url) {
            Some(url) if !unavailable && !url.is_empty() => urls.push(url),
            _ => skipped += 1,
        }
    }

    (urls, skipped)
}
