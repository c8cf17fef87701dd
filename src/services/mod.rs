//! Services layer
//!
//! Everything the HTTP handlers delegate to:
//! - Supabase auth and row storage
//! - The hosted model client and prompt builder
//! - HTML sanitization
//! - The payment method catalog

pub mod ai;
pub mod payments;
pub mod sanitizer;
pub mod supabase;

pub use ai::{build_prompt, AiClient, AiError, CompletionProvider, HostedModel};
pub use payments::{payment_methods_for_locale, PaymentMethod, PaymentMethodId, Region};
pub use sanitizer::sanitize_html;
pub use supabase::{AuthBackend, BackendError, RecordStore, SupabaseClient};
