//! Payment methods API endpoint
//!
//! GET /api/payments/methods?locale= lists the payment methods offered for a
//! locale. Without a query parameter the first `Accept-Language` tag is used,
//! then `en-US`.

use axum::{
    extract::Query,
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::middleware::AppState;
use crate::api::responses::json_success;
use crate::services::payments::{payment_methods_for_locale, region_for_locale};

const DEFAULT_LOCALE: &str = "en-US";

pub fn router() -> Router<AppState> {
    Router::new().route("/methods", get(list_methods))
}

#[derive(Debug, Deserialize)]
pub struct MethodsQuery {
    pub locale: Option<String>,
}

/// First language tag of an `Accept-Language` header, ignoring weights
fn preferred_language(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::ACCEPT_LANGUAGE)?.to_str().ok()?;
    value
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .find(|tag| !tag.is_empty() && *tag != "*")
        .map(str::to_string)
}

fn resolve_locale(query: Option<String>, headers: &HeaderMap) -> String {
    query
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .or_else(|| preferred_language(headers))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// GET /api/payments/methods
async fn list_methods(Query(query): Query<MethodsQuery>, headers: HeaderMap) -> Response {
    let locale = resolve_locale(query.locale, &headers);
    let region = region_for_locale(&locale);
    let methods = payment_methods_for_locale(&locale);

    json_success(json!({
        "locale": locale,
        "region": region,
        "methods": methods,
    }))
}
