//! Generation request shape

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to generate page markup from a prompt
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 4000, message = "Prompt must be between 1 and 4000 characters"))]
    pub prompt: String,
    /// Extra context appended after the prompt, e.g. the current page markup
    #[serde(default)]
    #[validate(length(max = 20000, message = "Context must be at most 20000 characters"))]
    pub context: Option<String>,
}

impl GenerateRequest {
    /// Caller-supplied context handed to the prompt builder
    pub fn combined_context(&self) -> String {
        match self.context.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{}\n\n{}", self.prompt.trim(), extra),
            _ => self.prompt.trim().to_string(),
        }
    }
}
