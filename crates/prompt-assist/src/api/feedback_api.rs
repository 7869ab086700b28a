use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{track, ApiError};
use crate::shared_state::UnifiedAppState;

/// Absent and `null` fields are treated the same.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub prompt_type: Option<String>,
    /// 1-5
    pub score: Option<i64>,
    pub feedback_text: Option<String>,
}

pub async fn submit_feedback(
    State(state): State<UnifiedAppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Response {
    let result = (|| {
        let Json(req) = payload?;
        let prompt_type = req.prompt_type.unwrap_or_default();
        let feedback_text = req.feedback_text.unwrap_or_default();
        let update = state.submit_feedback(&prompt_type, req.score, &feedback_text)?;
        info!("Feedback for {} (score {:?}): {:?}", prompt_type, req.score, update);
        Ok::<_, ApiError>(Json(json!({
            "success": true,
            "message": "Feedback recorded successfully",
        })))
    })();
    track("feedback", result)
}
