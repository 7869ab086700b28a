// Template listing, prompt execution and template registration
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use super::{track, ApiError};
use crate::shared_state::UnifiedAppState;

#[derive(Debug, Deserialize)]
pub struct RunPromptRequest {
    pub prompt_type: Option<String>,
    pub user_input: Option<String>,
}

/// Every field is required; `null` is treated like a missing field.
#[derive(Debug, Deserialize, Validate)]
pub struct AddPromptRequest {
    #[validate(required, length(min = 1))]
    pub id: Option<String>,
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
    #[validate(required, length(min = 1))]
    pub description: Option<String>,
    #[validate(required, length(min = 1))]
    pub prompt: Option<String>,
}

/// Overview: every template plus the upload index.
pub async fn index(State(state): State<UnifiedAppState>) -> Response {
    track(
        "index",
        Ok::<_, ApiError>(Json(json!({
            "prompts": state.templates.list(),
            "uploaded_files": state.uploads.list(),
        }))),
    )
}

pub async fn manage(State(state): State<UnifiedAppState>) -> Response {
    track(
        "manage",
        Ok::<_, ApiError>(Json(json!({ "prompts": state.templates.list() }))),
    )
}

pub async fn run_prompt(
    State(state): State<UnifiedAppState>,
    headers: HeaderMap,
    payload: Result<Json<RunPromptRequest>, JsonRejection>,
) -> Response {
    let result = async {
        let Json(req) = payload?;
        let session = state.sessions.from_headers(&headers);
        let prompt_type = req.prompt_type.unwrap_or_default();
        let user_input = req.user_input.unwrap_or_default();
        let run = state.run_prompt(session, &prompt_type, &user_input).await?;

        let mut response = Json(json!({
            "success": true,
            "response": run.response,
            "prompt_name": run.prompt_name,
            "session_id": run.session_id,
            "conversation_count": run.conversation_count,
        }))
        .into_response();
        if run.new_session {
            match HeaderValue::from_str(&state.sessions.set_cookie(&run.session_id)) {
                Ok(cookie) => {
                    response.headers_mut().insert(header::SET_COOKIE, cookie);
                }
                Err(e) => warn!("Could not encode session cookie: {}", e),
            }
        }
        Ok::<_, ApiError>(response)
    }
    .await;
    track("run_prompt", result)
}

pub async fn add_prompt(
    State(state): State<UnifiedAppState>,
    payload: Result<Json<AddPromptRequest>, JsonRejection>,
) -> Response {
    let result = (|| {
        let Json(req) = payload?;
        req.validate()
            .map_err(|_| ApiError::bad_request("All fields are required"))?;
        let field = |value: &Option<String>| value.as_deref().unwrap_or_default().to_string();
        let id = field(&req.id);
        let replaced = state.add_prompt(
            &id,
            &field(&req.name),
            &field(&req.description),
            &field(&req.prompt),
        )?;
        info!("Template '{}' registered (replaced: {})", id, replaced);
        Ok::<_, ApiError>(Json(json!({
            "success": true,
            "message": "Prompt added successfully",
            "replaced": replaced,
        })))
    })();
    track("add_prompt", result)
}
