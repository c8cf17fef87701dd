//! Data models
//!
//! Request shapes accepted by the API and the principal returned by the
//! auth backend. Every request shape derives `validator::Validate`; use
//! [`validate_payload`] to go from untyped JSON to a checked value.

mod auth;
mod export;
mod generate;
mod page;
mod project;
mod session;
mod user;
pub mod validation;

pub use auth::{LoginRequest, PasswordResetRequest, ProfileUpdateRequest, RegisterRequest};
pub use export::ExportRequest;
pub use generate::GenerateRequest;
pub use page::{CreatePageRequest, UpdatePageRequest};
pub use project::{CreateProjectRequest, UpdateProjectRequest};
pub use session::{AuthSession, SignUpOutcome};
pub use user::AuthUser;
pub use validation::{validate_payload, ValidationFailure};
