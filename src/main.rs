//! Research Agent - tool-using question answering over HTTP
//!
//! Each question runs a bounded loop in which a language model either answers
//! or asks for web searches and page scrapes, with per-thread transcripts
//! carried across requests.

mod api;
mod assembler;
mod config;
mod db;
mod llm;
mod runtime;
mod state_machine;
mod system_prompt;
mod tools;
mod transcript;

use api::{create_router, AppState};
use config::Config;
use db::Database;
use llm::{LlmService, LoggingService, OpenAIService};
use runtime::{DatabaseStorage, ResearchRuntime};
use std::future::Future;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tools::ToolRegistry;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transcript::{InMemoryTranscriptStore, TranscriptStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_agent=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;

    // Transcript storage
    let store: Arc<dyn TranscriptStore> = match &config.db_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %path.display(), "Opening transcript database");
            Arc::new(DatabaseStorage::new(Database::open(path)?))
        }
        None => {
            tracing::info!("Keeping transcripts in memory");
            Arc::new(InMemoryTranscriptStore::new())
        }
    };

    // Model and tools
    let openai: Arc<dyn LlmService> = Arc::new(OpenAIService::new(
        config.openai_api_key.clone(),
        config.model.clone(),
        &config.openai_base_url,
    )?);
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(openai));
    let tools = Arc::new(ToolRegistry::standard(&config.tool_settings())?);

    tracing::info!(
        model = %config.model,
        max_turns = config.max_turns,
        tool_timeout_secs = config.tool_timeout.as_secs(),
        "Research runtime initialized"
    );

    let runtime = ResearchRuntime::new(store, llm, tools, config.runtime_settings());
    let state = AppState::new(runtime);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let shutdown = shutdown_signal()?;
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "Research agent listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on SIGTERM or SIGINT. Handlers are installed before the server
/// starts so a failure to install them aborts startup.
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM - shutting down");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT - shutting down");
            }
        }
    })
}
