/// Catalog resolver tests against a mocked catalog API
use async_trait::async_trait;
use chorus_core::{
    ChorusError, FreeTextInterpreter, RequestKind, Resolution, Result, TrackDescriptor,
    TrackResolver,
};
use chorus_server::config::CatalogSettings;
use chorus_server::CatalogResolver;
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records searches and maps them to video links
#[derive(Default)]
struct RecordingSearch {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl FreeTextInterpreter for RecordingSearch {
    async fn interpret(&self, query: &str) -> Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        if query.contains("Unmatched") {
            return Err(ChorusError::no_match(query));
        }
        Ok(format!("https://video.test/{}", query.replace(' ', "-")))
    }
}

struct VideoSite;

#[async_trait]
impl TrackResolver for VideoSite {
    async fn resolve(&self, reference: &str, kind: RequestKind) -> Result<Resolution> {
        assert_eq!(kind, RequestKind::Single);
        let name = reference.trim_start_matches("https://video.test/");
        Ok(Resolution::single(TrackDescriptor::new(
            name,
            format!("https://cdn.test/{name}.m4a"),
            reference,
        )))
    }
}

fn settings(server: &MockServer, credentials: bool) -> CatalogSettings {
    CatalogSettings {
        client_id: credentials.then(|| "client".to_string()),
        client_secret: credentials.then(|| "secret".to_string()),
        api_url: format!("{}/v1", server.uri()),
        auth_url: format!("{}/api/token", server.uri()),
        timeout_secs: 5,
    }
}

fn resolver(server: &MockServer, search: Arc<RecordingSearch>) -> CatalogResolver {
    CatalogResolver::new(&settings(server, true), search, Arc::new(VideoSite)).unwrap()
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn item(name: &str, artist: &str) -> serde_json::Value {
    json!({ "track": { "name": name, "artists": [{ "name": artist }] } })
}

#[tokio::test]
async fn resolves_a_catalog_track_through_search() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/t1"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Song A",
            "artists": [{ "name": "Artist" }, { "name": "Feature" }]
        })))
        .mount(&server)
        .await;

    let search = Arc::new(RecordingSearch::default());
    let resolution = resolver(&server, search.clone())
        .resolve("https://open.spotify.com/track/t1", RequestKind::Single)
        .await
        .unwrap();

    assert_eq!(resolution.tracks.len(), 1);
    assert_eq!(resolution.tracks[0].title, "Song-A-Artist");
    assert_eq!(*search.queries.lock().unwrap(), vec!["Song A Artist".to_string()]);
}

#[tokio::test]
async fn follows_playlist_pages_and_counts_skips() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [item("One", "Band"), { "track": null }, item("Unmatched", "Nobody")],
            "next": format!("{}/v1/next-page/2", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/next-page/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [item("Two", "Band")],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = Arc::new(RecordingSearch::default());
    let resolution = resolver(&server, search.clone())
        .resolve(
            "https://open.spotify.com/playlist/pl1?si=share",
            RequestKind::CatalogPlaylist,
        )
        .await
        .unwrap();

    let titles: Vec<_> = resolution.tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["One-Band", "Two-Band"]);
    assert_eq!(resolution.skipped, 2);
    assert_eq!(search.queries.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn reuses_the_access_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": "Song", "artists": [] })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let resolver = resolver(&server, Arc::new(RecordingSearch::default()));
    for _ in 0..2 {
        resolver
            .resolve("spotify:track:t1", RequestKind::Single)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn huge_token_lifetime_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-forever",
            "token_type": "Bearer",
            "expires_in": u64::MAX
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/t1"))
        .and(header("authorization", "Bearer token-forever"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": "Song", "artists": [] })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let resolver = resolver(&server, Arc::new(RecordingSearch::default()));
    for _ in 0..2 {
        let resolution = resolver
            .resolve("spotify:track:t1", RequestKind::Single)
            .await
            .unwrap();
        assert_eq!(resolution.tracks[0].title, "Song");
    }
}

#[tokio::test]
async fn api_errors_fail_the_resolution() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/gone/tracks"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = resolver(&server, Arc::new(RecordingSearch::default()))
        .resolve("https://open.spotify.com/playlist/gone", RequestKind::CatalogPlaylist)
        .await
        .unwrap_err();

    assert!(matches!(err, ChorusError::ResolutionFailed(_)));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn rejected_credentials_fail_the_resolution() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_client"
        })))
        .mount(&server)
        .await;

    let err = resolver(&server, Arc::new(RecordingSearch::default()))
        .resolve("https://open.spotify.com/track/t1", RequestKind::Single)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("authentication failed"));
}

#[tokio::test]
async fn missing_credentials_never_call_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = CatalogResolver::new(
        &settings(&server, false),
        Arc::new(RecordingSearch::default()),
        Arc::new(VideoSite),
    )
    .unwrap();
    let err = resolver
        .resolve("https://open.spotify.com/track/t1", RequestKind::Single)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("not configured"));
}

#[tokio::test]
async fn non_catalog_links_are_refused() {
    let server = MockServer::start().await;

    let err = resolver(&server, Arc::new(RecordingSearch::default()))
        .resolve("https://www.youtube.com/watch?v=1", RequestKind::Single)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("not a catalog link"));
}
