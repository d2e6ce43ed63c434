//! Groq Chatbot
//!
//! A single-page multi-turn chat UI. Each browser session keeps its
//! conversation in memory and every submission is forwarded to the Groq
//! chat-completion API.

mod api;
mod chat;
mod config;
mod conversation;
mod credentials;
mod llm;
mod session;

use api::{create_router, AppState};
use config::ServerConfig;
use credentials::CredentialResolver;
use llm::GroqClientFactory;
use session::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "groq_chat=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServerConfig::from_env()?;

    let credentials = CredentialResolver::groq(&config.secrets_path);
    if credentials.resolve().is_some() {
        tracing::info!(secrets = %config.secrets_path.display(), "Groq API key available");
    } else {
        tracing::warn!(
            secrets = %config.secrets_path.display(),
            "No Groq API key found. Add Groq_api_key to the secrets file or set GROQ_API_KEY."
        );
    }

    // One connection pool shared by every per-request client
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()?;
    let clients = Arc::new(GroqClientFactory::new(http, config.groq_base_url.clone()));

    // Create application state
    let state = AppState::new(SessionStore::default(), credentials, clients);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("Groq Chatbot listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
