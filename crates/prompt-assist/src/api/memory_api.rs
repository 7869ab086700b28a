use axum::{extract::State, http::HeaderMap, response::Response, Json};
use serde_json::json;

use super::{track, ApiError};
use crate::shared_state::UnifiedAppState;

/// Persisted conversations of the caller's session; empty without a valid cookie.
pub async fn conversation_history(
    State(state): State<UnifiedAppState>,
    headers: HeaderMap,
) -> Response {
    let session = state.sessions.from_headers(&headers);
    let conversations = state.history(session.as_deref());
    track(
        "conversation_history",
        Ok::<_, ApiError>(Json(json!({ "conversations": conversations }))),
    )
}

pub async fn memory_stats(State(state): State<UnifiedAppState>) -> Response {
    track("memory_stats", Ok::<_, ApiError>(Json(state.stats())))
}
