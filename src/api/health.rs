//! Health check endpoint

use axum::{extract::State, response::Response, routing::get, Router};
use chrono::Utc;
use serde_json::json;

use crate::api::middleware::AppState;
use crate::api::responses::json_success;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Response {
    json_success(json!({
        "status": "ok",
        "environment": state.config.environment.to_string(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
