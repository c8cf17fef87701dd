//! Pageforge - API server for the Pageforge site builder

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pageforge::{
    api::{self, AppState},
    config::{Config, Environment},
    services::{HostedModel, SupabaseClient},
};

fn default_log_filter(environment: Environment) -> &'static str {
    if environment.is_development() {
        "pageforge=debug,tower_http=debug"
    } else {
        "pageforge=info,tower_http=info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Environment decides the default log level, so load config first
    let config = Config::load_with_env(Path::new("config.yml"))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(config.environment).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(environment = %config.environment, "Starting Pageforge API...");

    if config.ai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; generation requests will fail");
    }
    if config.frontend_url.is_none() {
        tracing::warn!("FRONTEND_URL is not set; password reset emails use the Supabase default redirect");
    }

    let supabase = Arc::new(SupabaseClient::new(&config.supabase)?);
    tracing::info!(url = %config.supabase.url, "Supabase client ready");

    let state = AppState {
        config: Arc::new(config.clone()),
        auth: supabase.clone(),
        records: supabase,
        completions: Arc::new(HostedModel::new(config.ai.clone())),
    };

    let app = api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
