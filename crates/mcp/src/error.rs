//! Error types for the MCP crate.

use finder_tool_runtime::ToolError;

use crate::types::{error_codes, JsonRpcError};

/// Errors that can occur during MCP operations.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Failed to parse JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Transport I/O error.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// HTTP binding failure (connect, timeout, body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP binding answered with a non-success status.
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The requested tool was not found in the registry.
    #[error("Tool not found")]
    ToolNotFound(String),

    /// Tool execution failed.
    #[error("{0}")]
    ToolExecution(String),

    /// The peer answered with a JSON-RPC error object.
    #[error("{message} (code {code})")]
    Rpc { code: i64, message: String },

    /// The peer sent no response for a request.
    #[error("No response to '{0}'")]
    NoResponse(String),

    /// A response arrived for a different request.
    #[error("Response id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: String, actual: String },

    /// The response carried neither result nor error.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The MCP server process exited or is unavailable.
    #[error("Server unavailable: {0}")]
    ServerUnavailable(String),
}

impl McpError {
    /// Convert to a JSON-RPC error object.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        let code = match self {
            McpError::JsonParse(_) => error_codes::PARSE_ERROR,
            McpError::ToolNotFound(_) => error_codes::METHOD_NOT_FOUND,
            McpError::Rpc { code, .. } => *code,
            _ => error_codes::INTERNAL_ERROR,
        };
        JsonRpcError {
            code,
            message: self.to_string(),
        }
    }
}

impl From<McpError> for ToolError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Rpc { code, message } => ToolError::Remote { code, message },
            other => ToolError::Unavailable(other.to_string()),
        }
    }
}
