mod api;
mod cli;
mod router;
mod startup;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn load_config() -> finder_core::Config {
    finder_core::config::load_dotenv();
    finder_core::Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the protocol in stdio mode, so logs always go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = load_config();
    config.log_summary();

    let store = startup::open_store(&config).await?;

    match cli.command() {
        Command::Stdio => startup::run_stdio(store).await?,
        Command::Http { port } => {
            let port = port.unwrap_or(config.server.mcp_port);
            startup::run_http(&config, store, port).await?;
        }
        Command::Seed { force } => {
            let inserted = startup::seed(&store, force).await;
            store.close().await;
            inserted?;
        }
    }

    Ok(())
}
