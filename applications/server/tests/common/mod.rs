//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chorus_core::{
    ChorusError, FreeTextInterpreter, RequestKind, Resolution, Result, TrackDescriptor,
    TrackResolver,
};
use chorus_playback::{Collaborators, Orchestrator, PlaybackConfig};
use chorus_server::{api, AppState, ClockDriverFactory, RecentStatusSink};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tower::util::ServiceExt;

pub const VIDEO_BASE: &str = "https://video.test/";

/// Resolves `https://video.test/<name>` links without touching the network
///
/// Names starting with `missing` fail. A `list-<n>` link is a playlist of
/// `n` tracks.
pub struct FakeVideoSite;

pub fn track(name: &str) -> TrackDescriptor {
    TrackDescriptor::new(
        name,
        format!("https://cdn.test/{name}.m4a"),
        format!("{VIDEO_BASE}{name}"),
    )
    .with_duration(Duration::from_secs(3600))
}

#[async_trait]
impl TrackResolver for FakeVideoSite {
    async fn resolve(&self, reference: &str, kind: RequestKind) -> Result<Resolution> {
        let name = reference
            .strip_prefix(VIDEO_BASE)
            .ok_or_else(|| ChorusError::resolution(format!("unsupported link {reference}")))?;

        if name.starts_with("missing") {
            return Err(ChorusError::resolution("video unavailable"));
        }

        match (kind, name.strip_prefix("list-")) {
            (RequestKind::Playlist, Some(count)) => {
                let count: usize = count.parse().unwrap_or(0);
                Ok(Resolution {
                    tracks: (1..=count).map(|i| track(&format!("entry-{i}"))).collect(),
                    skipped: 0,
                })
            }
            _ => Ok(Resolution::single(track(name))),
        }
    }
}

#[async_trait]
impl FreeTextInterpreter for FakeVideoSite {
    async fn interpret(&self, query: &str) -> Result<String> {
        if query == "nothing" {
            return Err(ChorusError::no_match(query));
        }
        Ok(format!("{VIDEO_BASE}{}", query.replace(' ', "-")))
    }
}

/// Test app wired with fake resolution and the clock driver
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let site = Arc::new(FakeVideoSite);
        let notifications = Arc::new(RecentStatusSink::new(20));
        let orchestrator = Orchestrator::start(
            &PlaybackConfig::default(),
            Collaborators {
                resolver: site.clone(),
                interpreter: site,
                drivers: Arc::new(ClockDriverFactory::new(
                    Handle::current(),
                    Duration::from_secs(3600),
                )),
                sink: notifications.clone(),
            },
        );

        let state = AppState::new(Arc::new(orchestrator), notifications);
        Self {
            router: api::router(state.clone()),
            state,
        }
    }

    /// Send a request and return the status with the parsed JSON body
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Title of the track a session is on, if any
    pub async fn current_title(&self, session: &str) -> Option<String> {
        let (_, snapshot) = self.get(&format!("/api/sessions/{session}")).await;
        snapshot["current"]["track"]["title"]
            .as_str()
            .map(str::to_string)
    }

    pub fn messages(&self, channel: &str) -> Vec<String> {
        self.state.notifications.recent(channel)
    }

    /// Wait until a session is on the given track
    pub async fn wait_for_title(&self, session: &str, title: &str) -> bool {
        eventually(|| async move { self.current_title(session).await.as_deref() == Some(title) })
            .await
    }

    /// Tracks waiting behind the current one
    pub async fn pending_len(&self, session: &str) -> usize {
        let (_, snapshot) = self.get(&format!("/api/sessions/{session}")).await;
        snapshot["pending"].as_array().map_or(0, Vec::len)
    }

    /// Wait until a session has `len` tracks pending
    pub async fn wait_for_pending(&self, session: &str, len: usize) -> bool {
        eventually(|| async move { self.pending_len(session).await == len }).await
    }

    /// Wait until a channel received a message starting with `prefix`
    pub async fn wait_for_message(&self, channel: &str, prefix: &str) -> bool {
        eventually(|| async move {
            self.messages(channel)
                .iter()
                .any(|message| message.starts_with(prefix))
        })
        .await
    }
}

/// Poll until `check` passes or about two seconds elapse
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
