/// Session API routes - request intake, control, and inspection
use crate::error::{Result, ServerError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chorus_core::{ControlAction, ControlOutcome, ReplyContext, RequestKind, SessionId};
use chorus_playback::{QueueStatus, SessionSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub reference: String,
    #[serde(default)]
    pub kind: RequestKind,
    /// Reply channel; defaults to the session ID
    pub channel: Option<String>,
    pub requested_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub session: SessionId,
    pub reference: String,
    pub kind: RequestKind,
    pub lane: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionId>,
}

/// POST /api/sessions/:id/requests - Queue a reference for resolution
pub async fn submit_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let session = SessionId::new(id);
    let reference = body.reference.trim().to_string();
    if reference.is_empty() {
        return Err(ServerError::BadRequest("reference must not be empty".to_string()));
    }

    let mut context = ReplyContext::new(
        body.channel
            .filter(|channel| !channel.is_empty())
            .unwrap_or_else(|| session.to_string()),
    );
    if let Some(user) = body.requested_by {
        context = context.requested_by(user);
    }

    state
        .orchestrator
        .submit_request(session.clone(), reference.clone(), body.kind, context)?;

    let lane = state.orchestrator.lane_for(&session);
    tracing::debug!(%session, %reference, kind = ?body.kind, lane, "request accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            session,
            reference,
            kind: body.kind,
            lane,
        }),
    ))
}

/// POST /api/sessions/:id/control/:action - Skip, pause, resume, stop, previous, or clear
pub async fn control(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<ControlOutcome>> {
    let action: ControlAction = action.parse()?;
    let outcome = state
        .orchestrator
        .control(&SessionId::new(id), action)
        .await;
    Ok(Json(outcome))
}

/// GET /api/sessions/:id - Snapshot of a session
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<SessionSnapshot> {
    Json(state.orchestrator.inspect(&SessionId::new(id)).await)
}

/// DELETE /api/sessions/:id - Forget a session's queue, history, and current track
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ControlOutcome> {
    Json(state.orchestrator.reset(&SessionId::new(id)).await)
}

/// GET /api/sessions - Known session IDs
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    let sessions = state.orchestrator.sessions().await;
    Json(SessionsResponse { sessions })
}

/// GET /api/queue-status - Pending requests and session count
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(state.orchestrator.queue_status())
}
