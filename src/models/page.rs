//! Page request shapes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Input for creating a page inside a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePageRequest {
    #[validate(length(min = 1, message = "Page name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Input for updating a page
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Page name cannot be empty"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}
