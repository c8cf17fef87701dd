//! Authentication request shapes
//!
//! Registration, login, password reset and profile update bodies.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::validation::rule_error;

/// Request body for account registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
}

/// Request body for password sign-in
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for a password-reset email
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Request body for updating the current user's profile
///
/// At least one field must be set, and changing the password requires the
/// current password. Rules are checked in that order and the first failure
/// is reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_profile_update"))]
pub struct ProfileUpdateRequest {
    pub full_name: Option<String>,
    #[validate(length(min = 2, message = "Username must be at least 2 characters"))]
    pub username: Option<String>,
    #[validate(url(message = "Avatar URL must be a valid URL"))]
    pub avatar_url: Option<String>,
    pub current_password: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

impl ProfileUpdateRequest {
    fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.username.is_none()
            && self.avatar_url.is_none()
            && self.current_password.is_none()
            && self.password.is_none()
    }

    /// Whether any user-metadata field is set
    pub fn has_metadata(&self) -> bool {
        self.full_name.is_some() || self.username.is_some() || self.avatar_url.is_some()
    }
}

fn validate_profile_update(request: &ProfileUpdateRequest) -> Result<(), ValidationError> {
    if request.is_empty() {
        return Err(rule_error(
            "empty_update",
            "At least one field must be provided",
        ));
    }
    if request.password.is_some() && request.current_password.is_none() {
        return Err(rule_error(
            "current_password_required",
            "Current password is required to set a new password",
        ));
    }
    Ok(())
}
