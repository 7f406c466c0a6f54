/// API route modules
pub mod health;
pub mod notifications;
pub mod sessions;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        // Sessions
        .route("/sessions", get(sessions::list_sessions))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::reset_session),
        )
        .route("/sessions/:id/requests", post(sessions::submit_request))
        .route("/sessions/:id/control/:action", post(sessions::control))
        .route("/queue-status", get(sessions::queue_status))
        // Status messages
        .route(
            "/notifications/:channel",
            get(notifications::recent_notifications),
        );

    Router::new()
        .nest("/api", api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
