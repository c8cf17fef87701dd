//! In-memory backends and a request helper for router tests

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use crate::api::{build_router, AppState};
use crate::config::Config;
use crate::models::{AuthSession, AuthUser, SignUpOutcome};
use crate::services::{AiError, AuthBackend, BackendError, CompletionProvider, RecordStore};

pub const FAKE_TOKEN: &str = "access-token-1";
pub const FAKE_PASSWORD: &str = "correct-horse";
/// Row id the fake store reports as missing
pub const MISSING_ID: &str = "00000000-0000-4000-8000-000000000404";
/// Row id the fake store refuses to touch
pub const FORBIDDEN_ID: &str = "00000000-0000-4000-8000-000000000403";

fn fake_user() -> AuthUser {
    AuthUser {
        id: "user-1".to_string(),
        email: Some("ada@example.com".to_string()),
        user_metadata: json!({"full_name": "Ada Lovelace"}),
        created_at: None,
    }
}

/// Auth backend that knows one user and records every call
#[derive(Default)]
pub struct FakeAuth {
    calls: Mutex<Vec<String>>,
}

impl FakeAuth {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        self.record("get_user".to_string());
        match access_token {
            FAKE_TOKEN => Ok(fake_user()),
            "expired-token" => Err(BackendError::Upstream {
                status: 403,
                message: "invalid JWT: token is expired".to_string(),
            }),
            _ => Err(BackendError::Upstream {
                status: 401,
                message: "Invalid token".to_string(),
            }),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        self.record(format!("sign_in:{}", email));
        if password != FAKE_PASSWORD {
            return Err(BackendError::Upstream {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(AuthSession {
            access_token: FAKE_TOKEN.to_string(),
            refresh_token: "refresh-token-1".to_string(),
            expires_in: 3600,
            user: fake_user(),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        metadata: Value,
    ) -> Result<SignUpOutcome, BackendError> {
        self.record(format!("sign_up:{}", email));
        Ok(SignUpOutcome {
            user: AuthUser {
                id: "user-2".to_string(),
                email: Some(email.to_string()),
                user_metadata: metadata,
                created_at: None,
            },
            session: None,
        })
    }

    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), BackendError> {
        self.record(format!(
            "send_password_reset:{}:{}",
            email,
            redirect_to.unwrap_or_default()
        ));
        if email.starts_with("ratelimited") {
            return Err(BackendError::Upstream {
                status: 429,
                message: "For security purposes, you can only request this once every 60 seconds"
                    .to_string(),
            });
        }
        Ok(())
    }

    async fn update_user(
        &self,
        _access_token: &str,
        attributes: Value,
    ) -> Result<AuthUser, BackendError> {
        self.record("update_user".to_string());
        let mut user = fake_user();
        if let (Some(current), Some(Value::Object(data))) =
            (user.user_metadata.as_object_mut(), attributes.get("data"))
        {
            for (key, value) in data {
                current.insert(key.clone(), value.clone());
            }
        }
        Ok(user)
    }
}

/// Record store that echoes writes back as stored rows
#[derive(Default)]
pub struct FakeStore {
    writes: Mutex<Vec<(String, String, Value)>>,
}

impl FakeStore {
    /// Most recent `(table, access_token, record)` written
    pub fn last_write(&self) -> Option<(String, String, Value)> {
        self.writes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn insert(
        &self,
        table: &str,
        access_token: &str,
        record: Value,
    ) -> Result<Value, BackendError> {
        self.writes
            .lock()
            .unwrap()
            .push((table.to_string(), access_token.to_string(), record.clone()));

        let mut row = record;
        if let Some(map) = row.as_object_mut() {
            map.entry("id")
                .or_insert_with(|| json!(uuid::Uuid::new_v4().to_string()));
            map.insert("created_at".to_string(), json!("2026-01-01T00:00:00Z"));
        }
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        access_token: &str,
        patch: Value,
    ) -> Result<Value, BackendError> {
        match id {
            MISSING_ID => return Err(BackendError::NotFound),
            FORBIDDEN_ID => {
                return Err(BackendError::Upstream {
                    status: 403,
                    message: "permission denied for table".to_string(),
                })
            }
            _ => {}
        }

        self.writes
            .lock()
            .unwrap()
            .push((table.to_string(), access_token.to_string(), patch.clone()));

        let mut row = patch;
        if let Some(map) = row.as_object_mut() {
            map.insert("id".to_string(), json!(id));
        }
        Ok(row)
    }
}

/// Completion provider with a canned reply
pub struct FakeCompletion {
    reply: Result<String, AiError>,
    prompts: Mutex<Vec<String>>,
}

impl FakeCompletion {
    pub fn replying(reply: Result<String, AiError>) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The full router wired to in-memory backends
pub struct TestApp {
    router: Router,
    pub auth: Arc<FakeAuth>,
    pub store: Arc<FakeStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_completions(
            config,
            Arc::new(FakeCompletion::replying(Ok("<p>generated</p>".to_string()))),
        )
    }

    pub fn with_completions(config: Config, completions: Arc<dyn CompletionProvider>) -> Self {
        let auth = Arc::new(FakeAuth::default());
        let store = Arc::new(FakeStore::default());
        let state = AppState {
            config: Arc::new(config),
            auth: auth.clone(),
            records: store.clone(),
            completions,
        };
        Self {
            router: build_router(state),
            auth,
            store,
        }
    }

    /// Send a request; `token` goes in the session cookie
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("sb-access-token={}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
