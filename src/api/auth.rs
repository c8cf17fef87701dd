//! Authentication API endpoints
//!
//! Handles HTTP requests for user authentication:
//! - POST /api/auth/register - Create an account
//! - POST /api/auth/login - Password sign-in, sets session cookies
//! - POST /api/auth/logout - Expire session cookies
//! - GET /api/auth/me - Get current user
//! - PATCH /api/auth/profile - Update profile and/or password
//! - POST /api/auth/reset-password - Send a password-reset email
//!
//! Sessions belong to Supabase; this module only moves its tokens in and out
//! of cookies.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Map, Value};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ValidatedJson};
use crate::api::responses::{json_success, json_success_with_status};
use crate::config::Environment;
use crate::models::{
    AuthSession, LoginRequest, PasswordResetRequest, ProfileUpdateRequest, RegisterRequest,
};
use crate::services::BackendError;

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Refresh tokens outlive access tokens; 30 days
const REFRESH_TOKEN_MAX_AGE: u64 = 30 * 24 * 60 * 60;

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
        .route("/profile", patch(update_profile))
        .route("/reset-password", post(reset_password))
}

// ============================================================================
// Cookies
// ============================================================================

/// `Set-Cookie` value for a session cookie; `Secure` outside development
pub fn session_cookie(name: &str, value: &str, max_age: u64, environment: Environment) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name, value, max_age
    );
    if !environment.is_development() {
        cookie.push_str("; Secure");
    }
    cookie
}

fn session_cookies(
    session: &AuthSession,
    environment: Environment,
) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            session_cookie(
                ACCESS_TOKEN_COOKIE,
                &session.access_token,
                session.expires_in,
                environment,
            ),
        ),
        (
            header::SET_COOKIE,
            session_cookie(
                REFRESH_TOKEN_COOKIE,
                &session.refresh_token,
                REFRESH_TOKEN_MAX_AGE,
                environment,
            ),
        ),
    ])
}

fn expired_cookies(environment: Environment) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            session_cookie(ACCESS_TOKEN_COOKIE, "", 0, environment),
        ),
        (
            header::SET_COOKIE,
            session_cookie(REFRESH_TOKEN_COOKIE, "", 0, environment),
        ),
    ])
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register - Create an account
///
/// When the Supabase project auto-confirms accounts the new session is set
/// as cookies; otherwise the user must confirm their email first.
async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    let outcome = state
        .auth
        .sign_up(
            &body.email,
            &body.password,
            json!({ "full_name": body.full_name }),
        )
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Sign-up failed");
            ApiError::bad_request("Unable to create account")
        })?;

    let data = json!({
        "user": outcome.user,
        "confirmationRequired": outcome.session.is_none(),
    });

    Ok(match outcome.session {
        Some(session) => (
            session_cookies(&session, state.config.environment),
            json_success_with_status(data, StatusCode::CREATED),
        )
            .into_response(),
        None => json_success_with_status(data, StatusCode::CREATED),
    })
}

/// POST /api/auth/login - Password sign-in
async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let session = state
        .auth
        .sign_in_with_password(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            BackendError::Upstream { .. } => ApiError::bad_request("Invalid email or password"),
            other => {
                tracing::warn!(error = %other, "Sign-in failed");
                ApiError::bad_request("Unable to sign in")
            }
        })?;

    tracing::debug!(user_id = %session.user.id, "User signed in");

    Ok((
        session_cookies(&session, state.config.environment),
        json_success(json!({ "user": session.user })),
    )
        .into_response())
}

/// POST /api/auth/logout - Expire session cookies
///
/// Always succeeds, with or without a session.
async fn logout(State(state): State<AppState>) -> Response {
    (
        expired_cookies(state.config.environment),
        json_success(json!({ "loggedOut": true })),
    )
        .into_response()
}

/// GET /api/auth/me - Get current user
async fn get_current_user(user: AuthenticatedUser) -> Response {
    json_success(json!({ "user": user.user }))
}

/// PATCH /api/auth/profile - Update the current user's profile
///
/// A password change re-verifies the current password first.
async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<ProfileUpdateRequest>,
) -> Result<Response, ApiError> {
    if let (Some(_), Some(current_password)) = (&body.password, &body.current_password) {
        let email = user
            .user
            .email
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("Account has no email address"))?;

        state
            .auth
            .sign_in_with_password(email, current_password)
            .await
            .map_err(|_| ApiError::bad_request("Current password is incorrect"))?;
    }

    let mut attributes = Map::new();
    if let Some(password) = &body.password {
        attributes.insert("password".to_string(), json!(password));
    }
    if body.has_metadata() {
        let mut data = Map::new();
        for (key, value) in [
            ("full_name", &body.full_name),
            ("username", &body.username),
            ("avatar_url", &body.avatar_url),
        ] {
            if let Some(value) = value {
                data.insert(key.to_string(), json!(value));
            }
        }
        attributes.insert("data".to_string(), Value::Object(data));
    }

    if attributes.is_empty() {
        return Ok(json_success(json!({ "user": user.user })));
    }

    let updated = state
        .auth
        .update_user(&user.access_token, Value::Object(attributes))
        .await
        .map_err(|e| ApiError::from_upstream(e, "Unable to update profile"))?;

    Ok(json_success(json!({ "user": updated })))
}

/// POST /api/auth/reset-password - Send a password-reset email
///
/// Upstream failures are reported as a generic 400; the detail is logged.
async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<PasswordResetRequest>,
) -> Result<Response, ApiError> {
    let redirect_to = state.config.password_reset_redirect();

    state
        .auth
        .send_password_reset(&body.email, redirect_to.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Password reset dispatch failed");
            ApiError::bad_request("Unable to send password reset email")
        })?;

    Ok(json_success(json!({ "sent": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{TestApp, FAKE_PASSWORD, FAKE_TOKEN};
    use crate::config::Config;
    use axum::http::Method;

    fn set_cookies(headers: &axum::http::HeaderMap) -> Vec<String> {
        headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_session_cookie_attributes() {
        let dev = session_cookie(ACCESS_TOKEN_COOKIE, "tok", 3600, Environment::Development);
        assert_eq!(
            dev,
            "sb-access-token=tok; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax"
        );

        let prod = session_cookie(ACCESS_TOKEN_COOKIE, "tok", 3600, Environment::Production);
        assert!(prod.ends_with("; Secure"));
    }

    #[tokio::test]
    async fn test_logout_without_session_expires_both_cookies() {
        let app = TestApp::new();
        let response = app.send(Method::POST, "/api/auth/logout", None, None).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"success": true, "data": {"loggedOut": true}}));

        let cookies = set_cookies(&response.headers);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=;")));
        assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=;")));
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert!(cookies.iter().all(|c| c.contains("HttpOnly") && c.contains("SameSite=Lax")));
        assert!(cookies.iter().all(|c| !c.contains("Secure")));
        assert!(app.auth.calls().is_empty());
    }

    #[tokio::test]
    async fn test_logout_with_session_in_production_sets_secure() {
        let mut config = Config::default();
        config.environment = Environment::Production;
        let app = TestApp::with_config(config);

        let response = app
            .send(Method::POST, "/api/auth/logout", None, Some(FAKE_TOKEN))
            .await;

        assert_eq!(response.body["success"], true);
        let cookies = set_cookies(&response.headers);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0") && c.contains("; Secure")));
    }

    #[tokio::test]
    async fn test_me_returns_user() {
        let app = TestApp::new();
        let response = app
            .send(Method::GET, "/api/auth/me", None, Some(FAKE_TOKEN))
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["user"]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_me_without_cookie_is_401() {
        let app = TestApp::new();
        let response = app.send(Method::GET, "/api/auth/me", None, None).await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body, json!({"success": false, "error": "Not authenticated"}));
        assert!(app.auth.calls().is_empty());
    }

    #[tokio::test]
    async fn test_me_passes_backend_rejection_through() {
        let app = TestApp::new();
        let response = app
            .send(Method::GET, "/api/auth/me", None, Some("expired-token"))
            .await;

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body["error"], "invalid JWT: token is expired");
    }

    #[tokio::test]
    async fn test_reset_password_success_uses_frontend_redirect() {
        let mut config = Config::default();
        config.frontend_url = Some("https://app.example.com".to_string());
        let app = TestApp::with_config(config);

        let response = app
            .send(
                Method::POST,
                "/api/auth/reset-password",
                Some(json!({"email": "ada@example.com"})),
                None,
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"success": true, "data": {"sent": true}}));
        assert_eq!(
            app.auth.calls(),
            vec!["send_password_reset:ada@example.com:https://app.example.com/reset-password"]
        );
    }

    #[tokio::test]
    async fn test_reset_password_malformed_email_makes_no_backend_call() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::POST,
                "/api/auth/reset-password",
                Some(json!({"email": "not-an-email"})),
                None,
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["success"], false);
        assert!(!response.body["error"].as_str().unwrap().is_empty());
        assert!(app.auth.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_missing_body_rejected() {
        let app = TestApp::new();
        let response = app
            .send(Method::POST, "/api/auth/reset-password", Some(json!({})), None)
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(app.auth.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_backend_error_is_generic_400() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::POST,
                "/api/auth/reset-password",
                Some(json!({"email": "ratelimited@example.com"})),
                None,
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "Unable to send password reset email");
    }

    #[tokio::test]
    async fn test_login_sets_session_cookies() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::POST,
                "/api/auth/login",
                Some(json!({"email": "ada@example.com", "password": FAKE_PASSWORD})),
                None,
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["user"]["id"], "user-1");
        let cookies = set_cookies(&response.headers);
        assert!(cookies
            .iter()
            .any(|c| c.starts_with(&format!("sb-access-token={};", FAKE_TOKEN))));
        assert!(cookies.iter().any(|c| c.contains("Max-Age=2592000")));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::POST,
                "/api/auth/login",
                Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
                None,
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "Invalid email or password");
        assert!(response.headers.get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_register_requires_confirmation() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::POST,
                "/api/auth/register",
                Some(json!({
                    "email": "grace@example.com",
                    "password": "compilers!",
                    "full_name": "Grace Hopper"
                })),
                None,
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["data"]["confirmationRequired"], true);
        assert_eq!(
            response.body["data"]["user"]["user_metadata"]["full_name"],
            "Grace Hopper"
        );
        assert!(response.headers.get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_register_missing_full_name_makes_no_backend_call() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::POST,
                "/api/auth/register",
                Some(json!({"email": "grace@example.com", "password": "compilers!"})),
                None,
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(app.auth.calls().is_empty());
    }

    #[tokio::test]
    async fn test_profile_update_empty_body_rejected() {
        let app = TestApp::new();
        let response = app
            .send(Method::PATCH, "/api/auth/profile", Some(json!({})), Some(FAKE_TOKEN))
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "At least one field must be provided");
        assert_eq!(app.auth.calls(), vec!["get_user"]);
    }

    #[tokio::test]
    async fn test_profile_update_password_change_reverifies() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::PATCH,
                "/api/auth/profile",
                Some(json!({"current_password": FAKE_PASSWORD, "password": "new-password-1"})),
                Some(FAKE_TOKEN),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            app.auth.calls(),
            vec!["get_user", "sign_in:ada@example.com", "update_user"]
        );
    }

    #[tokio::test]
    async fn test_profile_update_wrong_current_password() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::PATCH,
                "/api/auth/profile",
                Some(json!({"current_password": "nope-nope", "password": "new-password-1"})),
                Some(FAKE_TOKEN),
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "Current password is incorrect");
        assert!(!app.auth.calls().contains(&"update_user".to_string()));
    }

    #[tokio::test]
    async fn test_profile_update_metadata() {
        let app = TestApp::new();
        let response = app
            .send(
                Method::PATCH,
                "/api/auth/profile",
                Some(json!({"username": "ada", "avatar_url": "https://cdn.example.com/ada.png"})),
                Some(FAKE_TOKEN),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        let metadata = &response.body["data"]["user"]["user_metadata"];
        assert_eq!(metadata["username"], "ada");
        assert_eq!(metadata["full_name"], "Ada Lovelace");
    }
}
