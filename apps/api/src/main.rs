mod config;
mod enhance;
mod errors;
mod import;
mod llm_client;
mod models;
mod photo;
mod render;
mod routes;
mod state;
mod upload;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GeminiClient, LlmGateway};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting OptimumCV API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize GenAI gateway
    let gemini = GeminiClient::from_config(&config)?;
    if gemini.is_configured() {
        info!("GenAI client initialized (text model: {})", gemini.text_model());
    } else {
        warn!("GOOGLE_GENAI_API_KEY is not set; AI endpoints will return configuration errors");
    }

    // Build app state
    let state = AppState {
        llm: Arc::new(gemini),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
