//! CLI argument parsing.

use clap::{Parser, Subcommand};

/// human-finder tool provider.
///
/// Serves the `get_humans` tool over MCP, either on stdin/stdout for a
/// spawning client or over HTTP.
#[derive(Parser, Debug)]
#[command(name = "finder-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve MCP on stdin/stdout, one JSON-RPC message per line (default)
    Stdio,

    /// Serve MCP over HTTP (`POST /mcp`) plus the humans listing
    Http {
        /// Listen port (overrides MCP_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Apply migrations and insert the example humans
    Seed {
        /// Seed even if the table already has rows
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Stdio)
    }
}
