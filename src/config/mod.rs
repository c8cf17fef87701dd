//! Configuration management
//!
//! This module handles loading and parsing configuration for the Pageforge API.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Runtime environment (development, production, test)
    #[serde(default)]
    pub environment: Environment,
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Supabase project configuration
    #[serde(default)]
    pub supabase: SupabaseConfig,
    /// Hosted model provider configuration
    #[serde(default)]
    pub ai: AiConfig,
    /// Public URL of the frontend, used for password-reset redirects
    #[serde(default)]
    pub frontend_url: Option<String>,
}

/// Runtime environment, read from `NODE_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    /// Parse an environment name. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
            Environment::Test => write!(f, "test"),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Supabase project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. https://xyzcompany.supabase.co
    #[serde(default = "default_supabase_url")]
    pub url: String,
    /// Public anon key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: String,
    /// Upstream request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: default_supabase_url(),
            anon_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_supabase_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Hosted model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// API key; required before the first generation call
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// Model name
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    120
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognized variables:
    /// - NODE_ENV
    /// - OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL
    /// - FRONTEND_URL
    /// - SUPABASE_URL, SUPABASE_ANON_KEY
    /// - PAGEFORGE_SERVER_HOST, PAGEFORGE_SERVER_PORT, PAGEFORGE_SERVER_CORS_ORIGIN
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(env) = std::env::var("NODE_ENV") {
            if let Some(env) = Environment::parse(&env) {
                self.environment = env;
            }
        }

        if let Ok(host) = std::env::var("PAGEFORGE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PAGEFORGE_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("PAGEFORGE_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.supabase.url = url;
        }
        if let Ok(key) = std::env::var("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = key;
        }

        // Blank keys count as absent so the AI client fails fast
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.ai.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            self.ai.base_url = base_url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.ai.model = model;
        }

        if let Ok(url) = std::env::var("FRONTEND_URL") {
            self.frontend_url = Some(url).filter(|u| !u.trim().is_empty());
        }
    }

    /// Redirect target embedded in password-reset emails
    pub fn password_reset_redirect(&self) -> Option<String> {
        self.frontend_url
            .as_deref()
            .map(|url| format!("{}/reset-password", url.trim_end_matches('/')))
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
pub(crate) static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
