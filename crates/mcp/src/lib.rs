//! MCP (Model Context Protocol) plumbing between the agent runner and the
//! human-finder tool provider.
//!
//! # Architecture
//!
//! - **types**: JSON-RPC 2.0 and MCP-specific protocol types
//! - **transport**: server-side line transports (stdio, channels)
//! - **server**: MCP server wrapping a `ToolRegistry`
//! - **client_transport**: client-side bindings (stdio process, HTTP POST)
//! - **client**: MCP client, usable as a `ToolExecutor`
//! - **error**: unified error type with JSON-RPC code mapping
//!
//! # Usage
//!
//! ## Server
//! ```no_run
//! use finder_mcp::server::McpServer;
//! use finder_mcp::transport::StdioTransport;
//! use finder_tool_runtime::ToolRegistry;
//!
//! # async fn example() {
//! let server = McpServer::new(ToolRegistry::new());
//! let mut transport = StdioTransport::stdio();
//! server.run(&mut transport).await.unwrap();
//! # }
//! ```
//!
//! ## Client
//! ```no_run
//! use std::sync::Arc;
//! use finder_mcp::{McpClient, ProcessTransport};
//!
//! # async fn example() {
//! let transport = ProcessTransport::spawn("finder-server", &["stdio".to_string()]).unwrap();
//! let client = McpClient::connect(Arc::new(transport)).await.unwrap();
//! let tools = client.tools();
//! # }
//! ```

pub mod types;
pub mod transport;
pub mod server;
pub mod client_transport;
pub mod client;
pub mod error;

pub use types::*;
pub use transport::{ChannelTransport, LineTransport, McpTransport, StdioTransport};
pub use server::McpServer;
pub use client_transport::{HttpTransport, ProcessTransport, RpcTransport, StreamTransport};
pub use client::McpClient;
pub use error::McpError;
