//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - Auth endpoints (session cookies, profile, password reset)
//! - Project and page endpoints
//! - Export and generation endpoints
//! - Payment method catalog
//! - Health check

pub mod auth;
pub mod exports;
pub mod generate;
pub mod health;
pub mod middleware;
pub mod pages;
pub mod payments;
pub mod projects;
pub mod responses;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use std::any::Any;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", projects::router())
        .nest("/pages", pages::router())
        .nest("/exports", exports::router())
        .nest("/generate", generate::router())
        .nest("/payments", payments::router())
        .nest("/health", health::router())
}

fn cors_layer(cors_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE]);

    if cors_origin.trim() == "*" {
        tracing::warn!("CORS open to any origin; credentials disabled");
        return cors.allow_origin(AllowOrigin::any());
    }

    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin).allow_credentials(true),
        Err(e) => {
            tracing::warn!(origin = %cors_origin, error = %e, "Invalid CORS origin; cross-origin requests disabled");
            cors
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    with_middleware(Router::new().nest("/api", build_api_router()), state)
}

/// Wrap routes in the panic, CORS, trace and security-header layers
fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    let environment = state.config.environment;

    routes
        .layer(CatchPanicLayer::custom(move |err: Box<dyn Any + Send + 'static>| {
            middleware::panic_response(err, environment)
        }))
        .layer(cors_layer(&state.config.server.cors_origin))
        .layer(TraceLayer::new_for_http())
        // Outermost, so panics and rejections get the headers too
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers,
        ))
        .with_state(state)
}
