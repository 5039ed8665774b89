//! The two run modes.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::info;

use finder_core::Config;

use crate::agent::{stream_answer, Agent};
use crate::router::build_router;
use crate::state::ChatState;

/// Answer one prompt on stdout, flushing after every chunk.
pub async fn run_ask(agent: &Agent, prompt: String) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let answer = async move { stream_answer(agent, prompt, &tx).await };
    let print = async move {
        let mut stdout = tokio::io::stdout();
        while let Some(chunk) = rx.recv().await {
            stdout.write_all(chunk.as_bytes()).await?;
            stdout.flush().await?;
        }
        stdout.write_all(b"\n").await?;
        stdout.flush().await
    };

    let (answer, printed) = tokio::join!(answer, print);
    printed.context("Failed to write to stdout")?;
    answer?;
    Ok(())
}

pub async fn run_serve(config: &Config, agent: Agent, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(ChatState { agent });
    let app = build_router(state, &config.server.frontend_origins);

    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Chat endpoint listening on http://{}/mcp_client/chat", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Chat server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
