//! aipm-planner - AI Project Planner Service
//!
//! Manages project records in a SQLite-backed document store and uses an
//! LLM to synthesize project plans and task breakdowns.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use aipm_planner::config::Config;
use aipm_planner::llm::AzureOpenAiClient;
use aipm_planner::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting aipm-planner service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| anyhow::anyhow!("{}", e))?;
    info!("Database: {}", config.database_path.display());

    // Database connection pool, established once and shared by all requests
    let db_pool = aipm_planner::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    // Long-lived LLM client, configured once at startup
    let llm = AzureOpenAiClient::new(&config.llm)
        .map_err(|e| anyhow::anyhow!("Failed to initialize LLM client: {}", e))?;
    info!(deployment = %config.llm.deployment, "LLM client initialized");

    let state = AppState::new(db_pool, Arc::new(llm));
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
