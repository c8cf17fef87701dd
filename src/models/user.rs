//! Authenticated user model
//!
//! The principal returned by Supabase Auth. Only the fields this service
//! reads are modeled; anything else in the upstream payload is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user record as returned by Supabase Auth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Supabase user id (UUID)
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form profile metadata (`full_name`, `username`, `avatar_url`)
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}
