//! Process-wide handles and the three run modes.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use finder_core::Config;
use finder_humans::{GetHumansTool, HumanStore};
use finder_mcp::{McpServer, StdioTransport};
use finder_tool_runtime::ToolRegistry;

use crate::router::build_router;
use crate::state::AppState;

/// Connect to the database and bring its schema up to date.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<HumanStore>> {
    let store = HumanStore::connect(&config.database)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database.url))?;
    store.migrate().await.context("Failed to apply migrations")?;
    Ok(Arc::new(store))
}

/// The static tool catalog.
pub fn build_registry(store: Arc<HumanStore>) -> anyhow::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(GetHumansTool::new(store))?;
    Ok(registry)
}

pub async fn run_stdio(store: Arc<HumanStore>) -> anyhow::Result<()> {
    let server = McpServer::new(build_registry(store.clone())?);
    let mut transport = StdioTransport::stdio();
    server.run(&mut transport).await?;
    store.close().await;
    Ok(())
}

pub async fn run_http(config: &Config, store: Arc<HumanStore>, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        mcp: Arc::new(McpServer::new(build_registry(store.clone())?)),
        store: store.clone(),
    });
    let app = build_router(state, &config.server.frontend_origins);

    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("MCP server listening on http://{}/mcp", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");
    Ok(())
}

/// Insert the example humans unless the table already has rows.
pub async fn seed(store: &HumanStore, force: bool) -> anyhow::Result<usize> {
    let existing = store.count().await?;
    if existing > 0 && !force {
        anyhow::bail!(
            "humans table already has {} rows; pass --force to seed anyway",
            existing
        );
    }
    let inserted = store.seed_humans().await.context("Seeding failed")?;
    info!(inserted, "Seeded humans table");
    Ok(inserted)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
