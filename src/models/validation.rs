//! Payload validation
//!
//! Turns an untyped JSON payload into a typed request shape. Validation runs
//! in two stages: deserialization (types, required fields) and then the
//! `validator` rules declared on the shape, field rules first and struct-level
//! rules after them.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors};

/// Key under which struct-level rule failures are reported
pub const SCHEMA_FIELD: &str = "__all__";

/// A rejected payload
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationFailure {
    /// Human-readable summary, never empty
    pub message: String,
    /// Field name -> list of messages
    pub details: Value,
}

impl ValidationFailure {
    fn malformed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Value::Object(Map::new()),
        }
    }

    /// Whether a given field has at least one reported error
    pub fn has_field(&self, field: &str) -> bool {
        self.details.get(field).is_some()
    }
}

impl From<ValidationErrors> for ValidationFailure {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<(String, Vec<String>)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let field = field.to_string();
                let messages = errs.iter().map(|e| describe(&field, e)).collect();
                (field, messages)
            })
            .collect();
        fields.sort();

        let message = fields
            .iter()
            .flat_map(|(_, messages)| messages.first())
            .next()
            .cloned()
            .unwrap_or_else(|| "Invalid request body".to_string());

        let details = fields
            .into_iter()
            .map(|(field, messages)| (field, Value::from(messages)))
            .collect::<Map<String, Value>>();

        Self {
            message,
            details: Value::Object(details),
        }
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("{} is invalid ({})", field, error.code),
    }
}

/// Build a struct-level rule failure with a message
pub fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Validate an untyped payload against a request shape
pub fn validate_payload<T>(payload: Value) -> Result<T, ValidationFailure>
where
    T: DeserializeOwned + Validate,
{
    if !payload.is_object() {
        return Err(ValidationFailure::malformed(
            "Request body must be a JSON object",
        ));
    }

    let value: T = serde_json::from_value(payload)
        .map_err(|e| ValidationFailure::malformed(format!("Invalid request body: {}", e)))?;
    value.validate()?;
    Ok(value)
}

/// Validate raw request bytes against a request shape
pub fn validate_bytes<T>(bytes: &[u8]) -> Result<T, ValidationFailure>
where
    T: DeserializeOwned + Validate,
{
    let payload: Value = serde_json::from_slice(bytes)
        .map_err(|e| ValidationFailure::malformed(format!("Malformed JSON: {}", e)))?;
    validate_payload(payload)
}

/// `validator` custom rule: the value parses as a UUID
pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| rule_error("uuid", "Must be a valid UUID"))
}
