//! Shared test doubles for playback orchestration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chorus_core::{
    ChorusError, CompletionCallback, DriverStatus, FreeTextInterpreter, PlaybackDriver,
    PlaybackOutcome, ReplyContext, RequestKind, Resolution, Result, SessionId, StatusSink,
    StatusUpdate, TrackDescriptor, TrackResolver,
};
use chorus_playback::{Collaborators, Orchestrator, PlaybackConfig};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ===== Driver =====

/// In-memory driver that only finishes tracks when told to
///
/// Stopping fires the held callback with `Stopped`, like a real transport.
#[derive(Default)]
pub struct ScriptedDriver {
    inner: Mutex<DriverInner>,
}

#[derive(Default)]
struct DriverInner {
    status: DriverStatus,
    callback: Option<CompletionCallback>,
    played: Vec<String>,
    refuse: HashSet<String>,
}

impl ScriptedDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Refuse to start tracks with this title
    pub fn refuse(&self, title: &str) {
        self.inner.lock().unwrap().refuse.insert(title.to_string());
    }

    /// Titles passed to `play`, in order (refused ones excluded)
    pub fn played(&self) -> Vec<String> {
        self.inner.lock().unwrap().played.clone()
    }

    /// Title of the track the driver is on
    pub fn now_playing(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .status
            .is_active()
            .then(|| inner.played.last().cloned())
            .flatten()
    }

    /// End the current track naturally, reporting from a foreign thread
    pub fn finish(&self) -> bool {
        self.end(PlaybackOutcome::Finished)
    }

    /// End the current track with a transport error
    pub fn fail(&self, reason: &str) -> bool {
        self.end(PlaybackOutcome::Failed(reason.to_string()))
    }

    fn end(&self, outcome: PlaybackOutcome) -> bool {
        let callback = {
            let mut inner = self.inner.lock().unwrap();
            if !inner.status.is_active() {
                return false;
            }
            inner.status = DriverStatus::Idle;
            inner.callback.take()
        };
        match callback {
            Some(callback) => {
                std::thread::spawn(move || callback(outcome))
                    .join()
                    .unwrap();
                true
            }
            None => false,
        }
    }
}

impl PlaybackDriver for ScriptedDriver {
    fn play(&self, track: &TrackDescriptor, on_complete: CompletionCallback) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        assert!(
            !inner.status.is_active(),
            "play called while {} was still loaded",
            inner.played.last().map_or("?", String::as_str)
        );
        if inner.refuse.contains(&track.title) {
            return Err(ChorusError::playback_start(format!(
                "cannot open {}",
                track.playable
            )));
        }
        inner.status = DriverStatus::Playing;
        inner.callback = Some(on_complete);
        inner.played.push(track.title.clone());
        Ok(())
    }

    fn stop(&self) -> DriverStatus {
        let callback = {
            let mut inner = self.inner.lock().unwrap();
            inner.status = DriverStatus::Idle;
            inner.callback.take()
        };
        if let Some(callback) = callback {
            callback(PlaybackOutcome::Stopped);
        }
        DriverStatus::Idle
    }

    fn pause(&self) -> DriverStatus {
        let mut inner = self.inner.lock().unwrap();
        if inner.status == DriverStatus::Playing {
            inner.status = DriverStatus::Paused;
        }
        inner.status
    }

    fn resume(&self) -> DriverStatus {
        let mut inner = self.inner.lock().unwrap();
        if inner.status == DriverStatus::Paused {
            inner.status = DriverStatus::Playing;
        }
        inner.status
    }

    fn status(&self) -> DriverStatus {
        self.inner.lock().unwrap().status
    }
}

// ===== Resolver =====

/// URL prefix understood by [`FakeCatalog`]
pub const BASE: &str = "https://tracks.test/";

/// Single track URL
pub fn url(name: &str) -> String {
    format!("{BASE}{name}")
}

/// Playlist URL; names starting with `bad` fail individually
pub fn playlist(names: &[&str]) -> String {
    format!("{BASE}list/{}", names.join(","))
}

/// Resolver and interpreter over a naming convention
///
/// - `https://tracks.test/<name>` resolves to one track titled `<name>`
/// - `https://tracks.test/list/a,b,c` resolves to a, b, c
/// - `https://tracks.test/missing` fails
/// - `https://tracks.test/stall-<name>` waits until [`release`](Self::release)
/// - `fake:track:<name>` and `fake:playlist:a,b` mirror the URL forms
/// - free text `nothing` matches nothing; other text maps to its dashed URL
#[derive(Default)]
pub struct FakeCatalog {
    gate: Notify,
    resolved: Mutex<Vec<String>>,
    interpreted: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Let stalled resolutions proceed
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// References resolved so far, in completion order
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }

    /// Free-text queries seen by the interpreter
    pub fn interpreted(&self) -> Vec<String> {
        self.interpreted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackResolver for FakeCatalog {
    async fn resolve(&self, reference: &str, kind: RequestKind) -> Result<Resolution> {
        let path = if let Some(name) = reference.strip_prefix("fake:track:") {
            name.to_string()
        } else if let Some(list) = reference.strip_prefix("fake:playlist:") {
            format!("list/{list}")
        } else {
            reference
                .strip_prefix(BASE)
                .ok_or_else(|| ChorusError::resolution(format!("unsupported URL {reference}")))?
                .to_string()
        };

        if path == "missing" {
            return Err(ChorusError::resolution("video unavailable"));
        }
        if path.starts_with("stall-") {
            self.gate.notified().await;
        }

        let resolution = match (kind, path.strip_prefix("list/")) {
            (RequestKind::Single, _) | (_, None) => Resolution::single(track(&path)),
            (_, Some(list)) => {
                let names: Vec<&str> = list.split(',').collect();
                Resolution {
                    tracks: names
                        .iter()
                        .filter(|name| !name.starts_with("bad"))
                        .map(|name| track(name))
                        .collect(),
                    skipped: names.iter().filter(|name| name.starts_with("bad")).count(),
                }
            }
        };
        self.resolved.lock().unwrap().push(reference.to_string());
        Ok(resolution)
    }
}

#[async_trait]
impl FreeTextInterpreter for FakeCatalog {
    async fn interpret(&self, query: &str) -> Result<String> {
        self.interpreted.lock().unwrap().push(query.to_string());
        if query == "nothing" {
            return Err(ChorusError::no_match(query));
        }
        Ok(url(&query.replace(' ', "-")))
    }
}

pub fn track(name: &str) -> TrackDescriptor {
    TrackDescriptor::new(name, format!("stream://{name}"), url(name))
        .with_duration(Duration::from_secs(180))
}

// ===== Sink =====

/// Sink that records every update with its channel
#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<(String, StatusUpdate)>>,
}

impl RecordingSink {
    pub fn updates(&self) -> Vec<(String, StatusUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    /// Rendered messages sent to one channel
    pub fn messages(&self, channel: &str) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, update)| update.to_string())
            .collect()
    }
}

impl StatusSink for RecordingSink {
    fn notify(&self, context: &ReplyContext, update: StatusUpdate) {
        self.updates
            .lock()
            .unwrap()
            .push((context.channel.clone(), update));
    }
}

// ===== Harness =====

/// Orchestrator wired to test doubles
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub catalog: Arc<FakeCatalog>,
    pub sink: Arc<RecordingSink>,
    drivers: Arc<Mutex<HashMap<SessionId, Arc<ScriptedDriver>>>>,
    created_drivers: Arc<Mutex<usize>>,
}

impl Harness {
    pub fn start() -> Self {
        Self::with_config(&PlaybackConfig::default())
    }

    pub fn with_config(config: &PlaybackConfig) -> Self {
        let catalog = FakeCatalog::new();
        let sink = Arc::new(RecordingSink::default());
        let drivers: Arc<Mutex<HashMap<SessionId, Arc<ScriptedDriver>>>> = Arc::default();
        let created_drivers: Arc<Mutex<usize>> = Arc::default();

        let factory = {
            let drivers = Arc::clone(&drivers);
            let created = Arc::clone(&created_drivers);
            move |session: &SessionId| -> Arc<dyn PlaybackDriver> {
                *created.lock().unwrap() += 1;
                let driver = Arc::clone(
                    drivers
                        .lock()
                        .unwrap()
                        .entry(session.clone())
                        .or_insert_with(ScriptedDriver::new),
                );
                driver
            }
        };

        let orchestrator = Orchestrator::start(
            config,
            Collaborators {
                resolver: Arc::clone(&catalog) as Arc<dyn TrackResolver>,
                interpreter: Arc::clone(&catalog) as Arc<dyn FreeTextInterpreter>,
                drivers: Arc::new(factory),
                sink: Arc::clone(&sink) as Arc<dyn StatusSink>,
            },
        );

        Self {
            orchestrator,
            catalog,
            sink,
            drivers,
            created_drivers,
        }
    }

    /// Driver of a session, created ahead of the session if needed
    pub fn driver(&self, session: &SessionId) -> Arc<ScriptedDriver> {
        Arc::clone(
            self.drivers
                .lock()
                .unwrap()
                .entry(session.clone())
                .or_insert_with(ScriptedDriver::new),
        )
    }

    /// Number of times the driver factory was called
    pub fn drivers_created(&self) -> usize {
        *self.created_drivers.lock().unwrap()
    }

    /// Submit a request with the default reply context
    pub fn request(&self, session: &SessionId, reference: &str, kind: RequestKind) {
        self.orchestrator
            .submit_request(session.clone(), reference, kind, ReplyContext::new("music"))
            .unwrap();
    }

    /// Wait until every submitted request was processed
    pub async fn drain(&self) {
        eventually("intake to drain", || async move {
            self.orchestrator.queue_status().pending_requests == 0
        })
        .await;
    }

    /// Wait until the session's current track is `title`
    pub async fn wait_playing(&self, session: &SessionId, title: &str) {
        eventually(&format!("{title} to play in {session}"), || async move {
            self.orchestrator
                .inspect(session)
                .await
                .current
                .is_some_and(|entry| entry.title() == title)
                && self.driver(session).now_playing().as_deref() == Some(title)
        })
        .await;
    }

    /// Wait until the session has nothing loaded and nothing queued
    pub async fn wait_idle(&self, session: &SessionId) {
        eventually(&format!("{session} to go idle"), || async move {
            let snapshot = self.orchestrator.inspect(session).await;
            snapshot.is_idle() && snapshot.status == DriverStatus::Idle
        })
        .await;
    }

    /// Current, pending, and history titles of a session
    pub async fn titles(&self, session: &SessionId) -> (Option<String>, Vec<String>, Vec<String>) {
        let snapshot = self.orchestrator.inspect(session).await;
        (
            snapshot.current.map(|entry| entry.title().to_string()),
            snapshot
                .pending
                .iter()
                .map(|entry| entry.title().to_string())
                .collect(),
            snapshot
                .history
                .iter()
                .map(|entry| entry.title().to_string())
                .collect(),
        )
    }
}

/// Poll `check` until it holds, or panic after about two seconds
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
