//! CLI argument parsing.

use clap::{Parser, Subcommand};

use finder_core::TransportKind;

pub const DEFAULT_PROMPT: &str = "I am a cat, which human is best for me?";

/// human-finder agent runner.
///
/// Asks the model a question, letting it call the tool provider's
/// `get_humans` tool over MCP.
#[derive(Parser, Debug)]
#[command(name = "finder-client", version, about)]
pub struct Cli {
    /// How to reach the tool provider (overrides MCP_TRANSPORT)
    #[arg(long, global = true)]
    pub transport: Option<TransportKind>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer one prompt, streaming the reply to stdout
    Ask {
        /// The question for the model
        #[arg(default_value = DEFAULT_PROMPT)]
        prompt: String,
    },

    /// Serve the streaming chat endpoint (`POST /mcp_client/chat`)
    Serve {
        /// Listen port (overrides CLIENT_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}
