//! Supabase backend
//!
//! Two seams over the hosted backend:
//! - [`AuthBackend`]: session lookup, password sign-in, sign-up, password
//!   reset emails and user updates (Supabase Auth, `/auth/v1`)
//! - [`RecordStore`]: row inserts and updates (PostgREST, `/rest/v1`)
//!
//! [`SupabaseClient`] implements both over `reqwest`. Requests that act on
//! behalf of a user carry that user's access token, so row-level security is
//! enforced upstream.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::SupabaseConfig;
use crate::models::{AuthSession, AuthUser, SignUpOutcome};

/// Errors returned by the Supabase backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// Supabase answered with a non-success status
    #[error("Upstream rejected request ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// The request never completed
    #[error("Upstream request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape
    #[error("Unexpected upstream response: {0}")]
    Decode(String),

    /// An update matched no row visible to the caller
    #[error("Record not found")]
    NotFound,
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

/// Auth operations delegated to Supabase
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Resolve the user that owns an access token
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError>;

    /// Exchange email and password for a session
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError>;

    /// Create an account; `metadata` becomes the user's `user_metadata`
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpOutcome, BackendError>;

    /// Dispatch a password-reset email
    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), BackendError>;

    /// Update the token owner's password and/or metadata
    ///
    /// `attributes` follows the Supabase shape: `{"password": .., "data": {..}}`.
    async fn update_user(
        &self,
        access_token: &str,
        attributes: Value,
    ) -> Result<AuthUser, BackendError>;
}

/// Row storage delegated to Supabase
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a row and return it as stored
    async fn insert(
        &self,
        table: &str,
        access_token: &str,
        record: Value,
    ) -> Result<Value, BackendError>;

    /// Patch the row with the given id and return it as stored
    async fn update(
        &self,
        table: &str,
        id: &str,
        access_token: &str,
        patch: Value,
    ) -> Result<Value, BackendError>;
}

/// HTTP client for a Supabase project
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Attach the project key and the bearer token (anon key when acting anonymously)
    fn authorize(&self, request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn read_json(response: Response) -> Result<Value, BackendError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Pull a human-readable message out of a Supabase error body
///
/// Auth uses `msg` / `error_description`, PostgREST uses `message`.
pub fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}

/// PostgREST returns the affected rows as an array
fn first_row(value: Value) -> Result<Value, BackendError> {
    match value {
        Value::Array(rows) => rows.into_iter().next().ok_or(BackendError::NotFound),
        Value::Object(_) => Ok(value),
        other => Err(BackendError::Decode(format!("expected rows, got {}", other))),
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let request = self.authorize(self.http.get(self.auth_url("user")), Some(access_token));
        let value = Self::read_json(request.send().await?).await?;
        decode(value)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let request = self
            .authorize(self.http.post(self.auth_url("token")), None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let value = Self::read_json(request.send().await?).await?;
        decode(value)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpOutcome, BackendError> {
        let request = self
            .authorize(self.http.post(self.auth_url("signup")), None)
            .json(&json!({ "email": email, "password": password, "data": metadata }));
        let value = Self::read_json(request.send().await?).await?;

        // Auto-confirmed projects answer with a session, others with the bare user
        if value.get("access_token").is_some() {
            let session: AuthSession = decode(value)?;
            Ok(SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            })
        } else {
            let user = match value.get("user") {
                Some(user) => decode(user.clone())?,
                None => decode(value)?,
            };
            Ok(SignUpOutcome {
                user,
                session: None,
            })
        }
    }

    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut request = self
            .authorize(self.http.post(self.auth_url("recover")), None)
            .json(&json!({ "email": email }));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        Self::read_json(request.send().await?).await?;
        Ok(())
    }

    async fn update_user(
        &self,
        access_token: &str,
        attributes: Value,
    ) -> Result<AuthUser, BackendError> {
        let request = self
            .authorize(self.http.put(self.auth_url("user")), Some(access_token))
            .json(&attributes);
        let value = Self::read_json(request.send().await?).await?;
        decode(value)
    }
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn insert(
        &self,
        table: &str,
        access_token: &str,
        record: Value,
    ) -> Result<Value, BackendError> {
        let request = self
            .authorize(self.http.post(self.rest_url(table)), Some(access_token))
            .header("Prefer", "return=representation")
            .json(&record);
        let value = Self::read_json(request.send().await?).await?;
        first_row(value).map_err(|e| match e {
            BackendError::NotFound => BackendError::Decode("insert returned no rows".into()),
            other => other,
        })
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        access_token: &str,
        patch: Value,
    ) -> Result<Value, BackendError> {
        let filter = format!("eq.{}", id);
        let request = self
            .authorize(self.http.patch(self.rest_url(table)), Some(access_token))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&patch);
        let value = Self::read_json(request.send().await?).await?;
        first_row(value)
    }
}
