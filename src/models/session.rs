//! Session model

use serde::{Deserialize, Serialize};

use super::AuthUser;

/// Tokens issued by Supabase on sign-in or sign-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    pub user: AuthUser,
}

fn default_expires_in() -> u64 {
    3600
}

/// Result of a sign-up call
///
/// When email confirmation is enabled Supabase returns the user without a
/// session.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}
