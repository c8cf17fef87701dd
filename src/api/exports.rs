//! Export API endpoint
//!
//! POST /api/exports queues an export job. The job row starts as `pending`;
//! building the artifact happens elsewhere.

use axum::{extract::State, http::StatusCode, response::Response, routing::post, Router};
use serde_json::{json, Value};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ValidatedJson};
use crate::api::projects::to_record;
use crate::api::responses::json_success_with_status;
use crate::models::ExportRequest;

const EXPORTS_TABLE: &str = "exports";
const PENDING: &str = "pending";

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_export))
}

/// POST /api/exports - Queue an export
async fn create_export(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<ExportRequest>,
) -> Result<Response, ApiError> {
    let mut record = to_record(&body)?;
    record.insert("user_id".to_string(), json!(user.user.id));
    record.insert("status".to_string(), json!(PENDING));

    let export = state
        .records
        .insert(EXPORTS_TABLE, &user.access_token, Value::Object(record))
        .await
        .map_err(|e| ApiError::from_upstream(e, "Request failed"))?;

    tracing::info!(project_id = %body.project_id, format = %body.format, "Export queued");

    Ok(json_success_with_status(
        json!({ "export": export }),
        StatusCode::CREATED,
    ))
}
