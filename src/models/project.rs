//! Project request shapes

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, message = "Project name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,
}

/// Input for updating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,
}
