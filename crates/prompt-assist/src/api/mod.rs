//! HTTP handlers. Each one extracts its input, calls a [`SharedState`]
//! operation and turns the result into JSON.
//!
//! [`SharedState`]: crate::shared_state::SharedState

pub mod feedback_api;
pub mod memory_api;
pub mod prompt_api;
pub mod upload_api;

pub use feedback_api::{submit_feedback, FeedbackRequest};
pub use memory_api::{conversation_history, memory_stats};
pub use prompt_api::{add_prompt, index, manage, run_prompt, AddPromptRequest, RunPromptRequest};
pub use upload_api::{get_file, list_files, upload_file};

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::AssistError;
use crate::metrics;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.message,
                "code": self.status.as_u16(),
            })),
        )
            .into_response()
    }
}

impl From<AssistError> for ApiError {
    fn from(err: AssistError) -> Self {
        let status = match &err {
            AssistError::Validation(_) => StatusCode::BAD_REQUEST,
            AssistError::NotFound(_) => StatusCode::NOT_FOUND,
            AssistError::Generation(_) => StatusCode::BAD_GATEWAY,
            AssistError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("{}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Count the outcome for `route` and pass the result through unchanged.
pub(crate) fn track<T: IntoResponse>(route: &str, result: Result<T, ApiError>) -> Response {
    let response = match result {
        Ok(body) => body.into_response(),
        Err(e) => e.into_response(),
    };
    metrics::inc_request(route, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;

    #[test]
    fn error_kinds_map_to_statuses() {
        let cases = [
            (AssistError::validation("bad"), StatusCode::BAD_REQUEST),
            (AssistError::not_found("File not found"), StatusCode::NOT_FOUND),
            (GenerationError::Empty.into(), StatusCode::BAD_GATEWAY),
            (
                AssistError::io("Upload error", std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn message_is_carried_verbatim() {
        let api: ApiError = AssistError::validation("Please provide input").into();
        assert_eq!(api.message, "Please provide input");
        assert_eq!(api.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
