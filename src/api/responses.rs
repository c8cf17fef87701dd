//! Shared API response types
//!
//! Every handler answers with the same envelope:
//! `{ "success": bool, "data"?: T, "error"?: string, "details"?: object }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform JSON response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            details,
        }
    }
}

/// Options for [`json_error`]
#[derive(Debug, Clone)]
pub struct ErrorOptions {
    pub status: StatusCode,
    pub details: Option<Value>,
}

impl Default for ErrorOptions {
    fn default() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            details: None,
        }
    }
}

/// 200 with `{ success: true, data }`
pub fn json_success<T: Serialize>(data: T) -> Response {
    json_success_with_status(data, StatusCode::OK)
}

/// `{ success: true, data }` with a custom status
pub fn json_success_with_status<T: Serialize>(data: T, status: StatusCode) -> Response {
    (status, Json(Envelope::ok(data))).into_response()
}

/// `{ success: false, error }`, 400 unless the options say otherwise
pub fn json_error(message: impl Into<String>, options: ErrorOptions) -> Response {
    (
        options.status,
        Json(Envelope::failure(message, options.details)),
    )
        .into_response()
}
