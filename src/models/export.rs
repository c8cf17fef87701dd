//! Export request shape

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation::validate_uuid;

/// Request to export a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExportRequest {
    #[validate(custom(function = "validate_uuid"))]
    pub project_id: String,
    #[validate(length(min = 1, message = "Export type is required"))]
    pub export_type: String,
    #[validate(length(min = 1, message = "Format is required"))]
    pub format: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validation::validate_payload;
    use serde_json::json;

    #[test]
    fn test_accepts_valid_export() {
        let req: ExportRequest = validate_payload(json!({
            "project_id": "3b241101-e2bb-4255-8caf-4136c566a962",
            "export_type": "static-site",
            "format": "zip"
        }))
        .unwrap();
        assert_eq!(req.format, "zip");
    }

    #[test]
    fn test_rejects_bad_project_id() {
        let err = validate_payload::<ExportRequest>(json!({
            "project_id": "42",
            "export_type": "static-site",
            "format": "zip"
        }))
        .unwrap_err();
        assert_eq!(err.message, "Must be a valid UUID");
        assert!(err.has_field("project_id"));
    }

    #[test]
    fn test_rejects_empty_format() {
        let err = validate_payload::<ExportRequest>(json!({
            "project_id": "3b241101-e2bb-4255-8caf-4136c566a962",
            "export_type": "static-site",
            "format": ""
        }))
        .unwrap_err();
        assert_eq!(err.message, "Format is required");
    }
}
