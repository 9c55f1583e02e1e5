//! `EcoBot` - sustainability Q&A service
//!
//! Routes each user message through location extraction and topic
//! classification to one of four specialist agents, keeping a
//! per-session transcript between turns.

mod agents;
mod api;
mod chat;
mod config;
mod db;
mod evaluation;
mod llm;
mod metrics;
mod session;
mod tools;
mod transcript;
mod workflow;

use api::{create_router, AppState};
use chat::ChatService;
use config::{ServerConfig, SessionBackend};
use db::Database;
use evaluation::Evaluator;
use llm::{LlmConfig, ModelRegistry};
use session::{MemorySessionStore, SessionStore, SqliteSessionStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tools::{EpaWaterTool, ToolRegistry, WebSearchTool};
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
                .unwrap_or_else(|_| "ecobot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ServerConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    // Initialize LLM registry
    let llm_registry = Arc::new(ModelRegistry::new(&LlmConfig::from_env()));
    let Some(agent_llm) = llm_registry.default() else {
        tracing::error!(
            model = %llm_registry.default_model_id(),
            "No LLM available. Set OPENAI_API_KEY or LLM_GATEWAY."
        );
        return Err("no LLM configured".into());
    };
    tracing::info!(
        models = ?llm_registry.available_models(),
        default = %llm_registry.default_model_id(),
        "LLM registry initialized"
    );

    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Sqlite => Arc::new(SqliteSessionStore::new(db.clone())),
    };

    let specialist_tools = match llm_registry.search() {
        Some(search_llm) => {
            ToolRegistry::empty().with_tool(Arc::new(WebSearchTool::new(search_llm)))
        }
        None => ToolRegistry::empty(),
    };
    let water_tools = match &config.epa_api_key {
        Some(key) => specialist_tools
            .clone()
            .with_tool(Arc::new(EpaWaterTool::new(key.clone()))),
        None => {
            tracing::info!("EPA_API_KEY not set; water specialist runs without EPA data");
            specialist_tools.clone()
        }
    };
    if specialist_tools.is_empty() {
        tracing::info!(
            model = %llm_registry.search_model_id(),
            "Search model unavailable; specialists run without web search"
        );
    }

    let evaluator = if config.evaluate {
        llm_registry.evaluator().map(Evaluator::new)
    } else {
        None
    };
    if let Some(evaluator) = &evaluator {
        tracing::info!(model = %evaluator.model_id(), "Turn evaluation enabled");
    }

    let orchestrator = agents::build_orchestrator(agent_llm, &specialist_tools, &water_tools);
    let chat = ChatService::new(orchestrator, sessions, db, evaluator);
    let state = AppState::new(chat, llm_registry);

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
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(session_store = ?config.session_backend, "EcoBot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
