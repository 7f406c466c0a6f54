/// Recent status messages per reply channel
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub channel: String,
    pub messages: Vec<String>,
}

/// GET /api/notifications/:channel - Latest messages, oldest first
pub async fn recent_notifications(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Json<NotificationsResponse> {
    let messages = state.notifications.recent(&channel);
    Json(NotificationsResponse { channel, messages })
}
