//! Pages API endpoints
//!
//! - POST /api/projects/{id}/pages - Add a page to a project
//! - PATCH /api/pages/{id} - Update a page
//!
//! Page markup is sanitized before it reaches storage.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::patch,
    Router,
};
use serde_json::{json, Value};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ValidatedJson};
use crate::api::projects::{parse_id, to_record};
use crate::api::responses::{json_success, json_success_with_status};
use crate::models::{CreatePageRequest, UpdatePageRequest};
use crate::services::sanitize_html;

const PAGES_TABLE: &str = "pages";

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", patch(update_page))
}

/// Derive a URL slug from a page name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug.to_string()
    }
}

/// POST /api/projects/{id}/pages - Create a page
pub(crate) async fn create_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(project_id): Path<String>,
    ValidatedJson(mut body): ValidatedJson<CreatePageRequest>,
) -> Result<Response, ApiError> {
    let project_id = parse_id(&project_id)?;

    body.html_content = body.html_content.as_deref().map(sanitize_html);
    if body.slug.as_deref().map_or(true, |s| s.trim().is_empty()) {
        body.slug = Some(slugify(&body.name));
    }

    let mut record = to_record(&body)?;
    record.insert("project_id".to_string(), json!(project_id.to_string()));

    let page = state
        .records
        .insert(PAGES_TABLE, &user.access_token, Value::Object(record))
        .await
        .map_err(|e| ApiError::from_upstream(e, "Request failed"))?;

    Ok(json_success_with_status(json!({ "page": page }), StatusCode::CREATED))
}

/// PATCH /api/pages/{id} - Update a page
async fn update_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(mut body): ValidatedJson<UpdatePageRequest>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;

    body.html_content = body.html_content.as_deref().map(sanitize_html);

    let patch = to_record(&body)?;

    let page = state
        .records
        .update(
            PAGES_TABLE,
            &id.to_string(),
            &user.access_token,
            Value::Object(patch),
        )
        .await
        .map_err(|e| ApiError::from_upstream(e, "Request failed"))?;

    Ok(json_success(json!({ "page": page })))
}
