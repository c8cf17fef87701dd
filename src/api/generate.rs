//! Generation API endpoint
//!
//! POST /api/generate turns a prompt into page markup via the hosted model.
//! The model output is sanitized like any other page content.

use axum::{extract::State, response::Response, routing::post, Router};
use serde_json::json;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ValidatedJson};
use crate::api::responses::json_success;
use crate::models::GenerateRequest;
use crate::services::{build_prompt, sanitize_html, AiError};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(generate))
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::MissingApiKey => {
                tracing::error!(error = %err, "AI provider not configured");
                ApiError::internal_error("AI provider is not configured")
            }
            AiError::Client(_) => {
                tracing::error!(error = %err, "AI client could not be built");
                ApiError::internal_error("AI provider is unavailable")
            }
            other => {
                tracing::warn!(error = %other, "Generation failed");
                ApiError::bad_request("Generation failed")
            }
        }
    }
}

/// POST /api/generate - Generate page markup
async fn generate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<GenerateRequest>,
) -> Result<Response, ApiError> {
    let prompt = build_prompt(&body.combined_context());

    tracing::debug!(user_id = %user.user.id, prompt_len = prompt.len(), "Generating page markup");

    let raw = state.completions.complete(&prompt).await?;
    let html = sanitize_html(&raw);

    Ok(json_success(json!({ "html": html })))
}
