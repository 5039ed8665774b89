mod agent;
mod api;
mod cli;
mod router;
mod startup;
mod state;

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the answer in ask mode.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    finder_core::config::load_dotenv();
    let config = finder_core::Config::from_env();
    config.log_summary();

    let provider = finder_llm::create_tool_provider(&config.llm)
        .context("Failed to create the model provider")?;
    let tools = agent::connect_tools(&config, cli.transport.unwrap_or(config.mcp.transport)).await?;
    let agent = agent::build_agent(&config, provider, tools.clone());

    let result = match cli.command {
        Command::Ask { prompt } => startup::run_ask(&agent, prompt).await,
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.client_port);
            startup::run_serve(&config, agent, port).await
        }
    };

    if let Err(e) = tools.shutdown().await {
        warn!(error = %e, "MCP client shutdown failed");
    }
    result
}
