//! API middleware and extractors
//!
//! Contains:
//! - Application state shared by all handlers
//! - `ApiError`, rendered as the failure envelope
//! - The auth guard (`require_auth` / `AuthenticatedUser`)
//! - `ValidatedJson`, which rejects bodies that fail their schema
//! - Security headers and the panic fallback

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use validator::Validate;

use crate::api::auth::ACCESS_TOKEN_COOKIE;
use crate::api::responses::{json_error, ErrorOptions};
use crate::config::{Config, Environment};
use crate::models::validation::validate_bytes;
use crate::models::{AuthUser, ValidationFailure};
use crate::services::{AuthBackend, BackendError, CompletionProvider, RecordStore};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthBackend>,
    pub records: Arc<dyn RecordStore>,
    pub completions: Arc<dyn CompletionProvider>,
}

/// Error returned by handlers and extractors
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a record-store failure for a client
    ///
    /// Auth rejections keep their status, a missing row becomes 404, and
    /// anything else becomes a 400 with `fallback` as the message.
    pub fn from_upstream(err: BackendError, fallback: &str) -> Self {
        match err {
            BackendError::Upstream { status, message } if status == 401 || status == 403 => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::UNAUTHORIZED);
                Self::new(status, message)
            }
            BackendError::NotFound => Self::not_found("Not found"),
            other => {
                tracing::warn!(error = %other, "{}", fallback);
                Self::bad_request(fallback)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(
            self.message,
            ErrorOptions {
                status: self.status,
                details: self.details,
            },
        )
    }
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        Self::validation_error(failure.message).with_details(failure.details)
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Caller resolved by the auth guard
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: AuthUser,
    /// Token the user authenticated with, forwarded on their behalf
    pub access_token: String,
}

/// Extract the access token from the session cookie or a bearer header
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(ACCESS_TOKEN_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        });

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Resolve the caller's session via the auth backend
///
/// On failure the returned error is meant to be sent back unchanged; a
/// rejection from Supabase keeps its status and message.
pub async fn require_auth(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, ApiError> {
    let access_token =
        extract_access_token(headers).ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    match state.auth.get_user(&access_token).await {
        Ok(user) => Ok(AuthenticatedUser { user, access_token }),
        Err(BackendError::Upstream { status, message }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::UNAUTHORIZED);
            Err(ApiError::new(status, message))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed");
            Err(ApiError::unauthorized("Authentication failed"))
        }
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_auth(state, &parts.headers).await
    }
}

// ============================================================================
// Validated bodies
// ============================================================================

/// JSON body that passed its validation schema
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|e| ApiError::validation_error(format!("Invalid request body: {}", e.body_text())))?;
        Ok(ValidatedJson(validate_bytes(&bytes)?))
    }
}

// ============================================================================
// Response hardening
// ============================================================================

const PERMISSIONS_POLICY: &str = "camera=(), microphone=(), geolocation=()";
const HSTS: &str = "max-age=63072000; includeSubDomains; preload";

/// Add security headers to every response; HSTS in production only
pub async fn security_headers(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    apply_security_headers(response.headers_mut(), state.config.environment);
    response
}

pub fn apply_security_headers(headers: &mut HeaderMap, environment: Environment) {
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(PERMISSIONS_POLICY),
    );
    if environment.is_production() {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        );
    }
}

/// Fallback response for a panicking handler
///
/// The panic message is logged outside production only.
pub fn panic_response(err: Box<dyn Any + Send + 'static>, environment: Environment) -> Response {
    if !environment.is_production() {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.as_str()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            *s
        } else {
            "unknown panic payload"
        };
        tracing::error!(panic = %detail, "Request handler panicked");
    }
    ApiError::internal_error("Something went wrong").into_response()
}

// ============================================================================
// Tests
// ============================================================================
