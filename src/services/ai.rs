//! Hosted model client
//!
//! One [`AiClient`] is built on first use and shared for the life of the
//! process. Building it requires an API key; without one the first call
//! fails with [`AiError::MissingApiKey`] and nothing is cached.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::AiConfig;

const ROLE_STATEMENT: &str = "You are an expert web designer and front-end engineer. \
You build modern, accessible, responsive page sections.";

const OUTPUT_CONSTRAINT: &str = "Respond with a single HTML fragment styled only with \
Tailwind CSS utility classes. Do not include <html>, <head>, <body>, <script> or <style> \
tags, do not wrap the answer in Markdown, and do not add any explanation.";

static AI_CLIENT: RwLock<Option<Arc<AiClient>>> = RwLock::new(None);

/// Errors from the model provider wrapper
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AiError {
    #[error("OPENAI_API_KEY is not configured; set it to enable AI generation")]
    MissingApiKey,

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("AI provider request failed: {message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("AI provider returned no content")]
    EmptyResponse,
}

/// Something that turns a prompt into a completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

/// Client for an OpenAI-compatible chat completions API
#[derive(Debug)]
pub struct AiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl AiClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AiError::MissingApiKey)?
            .to_string();

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AiError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt and return the first choice's text
    pub async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
                temperature: 0.7,
            })
            .send()
            .await
            .map_err(|e| AiError::Provider {
                status: None,
                message: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Provider {
                status: Some(status.as_u16()),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| AiError::Provider {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AiError::EmptyResponse)?;

        let content = strip_code_fence(&content);
        if content.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

/// Get the shared client, building it on first use
pub fn client(config: &AiConfig) -> Result<Arc<AiClient>, AiError> {
    {
        let cached = AI_CLIENT.read().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = cached.as_ref() {
            return Ok(Arc::clone(client));
        }
    }

    let mut slot = AI_CLIENT.write().unwrap_or_else(|e| e.into_inner());
    if let Some(client) = slot.as_ref() {
        return Ok(Arc::clone(client));
    }

    let client = Arc::new(AiClient::new(config)?);
    tracing::info!(model = %client.model(), "AI client initialized");
    *slot = Some(Arc::clone(&client));
    Ok(client)
}

/// Drop the shared client so the next call rebuilds it
#[cfg(test)]
pub(crate) fn reset_client() {
    *AI_CLIENT.write().unwrap_or_else(|e| e.into_inner()) = None;
}

/// Serializes tests that touch the shared client
#[cfg(test)]
pub(crate) static AI_TEST_MUTEX: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Compose the instruction preamble and the caller context into one prompt
pub fn build_prompt(context: &str) -> String {
    format!(
        "{}\n\n{}\n\nContext:\n{}",
        ROLE_STATEMENT,
        OUTPUT_CONSTRAINT,
        context.trim()
    )
}

/// Remove a surrounding ```html fence if the model added one anyway
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// The hosted model, reached through the shared [`client`]
pub struct HostedModel {
    config: AiConfig,
}

impl HostedModel {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CompletionProvider for HostedModel {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        client(&self.config)?.complete(prompt).await
    }
}
