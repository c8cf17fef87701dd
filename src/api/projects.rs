//! Project API endpoints
//!
//! - POST /api/projects - Create a project owned by the caller
//! - PATCH /api/projects/{id} - Update a project
//!
//! Rows live in the `projects` table; every call carries the caller's token
//! so row-level security decides what they may touch.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{patch, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ValidatedJson};
use crate::api::pages;
use crate::api::responses::{json_success, json_success_with_status};
use crate::models::{CreateProjectRequest, UpdateProjectRequest};

const PROJECTS_TABLE: &str = "projects";

/// Build the projects router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_project))
        .route("/{id}", patch(update_project))
        .route("/{id}/pages", post(pages::create_page))
}

/// Parse a row id from the path
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid id"))
}

/// Serialize a request body into a JSON object for the record store
pub(crate) fn to_record<T: Serialize>(body: &T) -> Result<serde_json::Map<String, Value>, ApiError> {
    match serde_json::to_value(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::internal_error("Request body must be a JSON object")),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize record");
            Err(ApiError::internal_error("Failed to prepare record"))
        }
    }
}

/// POST /api/projects - Create a project
async fn create_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<CreateProjectRequest>,
) -> Result<Response, ApiError> {
    let mut record = to_record(&body)?;
    record.insert("user_id".to_string(), json!(user.user.id));

    let project = state
        .records
        .insert(PROJECTS_TABLE, &user.access_token, Value::Object(record))
        .await
        .map_err(|e| ApiError::from_upstream(e, "Request failed"))?;

    tracing::info!(user_id = %user.user.id, "Project created");

    Ok(json_success_with_status(
        json!({ "project": project }),
        StatusCode::CREATED,
    ))
}

/// PATCH /api/projects/{id} - Update a project
async fn update_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateProjectRequest>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let patch = to_record(&body)?;

    let project = state
        .records
        .update(
            PROJECTS_TABLE,
            &id.to_string(),
            &user.access_token,
            Value::Object(patch),
        )
        .await
        .map_err(|e| ApiError::from_upstream(e, "Request failed"))?;

    Ok(json_success(json!({ "project": project })))
}
