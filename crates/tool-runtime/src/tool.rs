use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Describes a tool's interface for LLM consumption.
/// Maps to the MCP `tools/list` entry and to Gemini's function declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name (e.g., "get_humans")
    pub name: String,
    /// Human-readable description for the LLM
    pub description: String,
    /// JSON Schema describing the expected input
    pub input_schema: Value,
}

/// Represents an LLM requesting execution of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this invocation (used to match results)
    pub id: String,
    /// Tool name to execute
    pub name: String,
    /// JSON input arguments
    pub input: Value,
    /// Opaque provider token that must accompany the call when the turn is
    /// replayed (Gemini `thoughtSignature`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
}

/// Result of executing a tool, sent back to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Must match the ToolCall id
    pub tool_call_id: String,
    /// Name of the tool that produced this result; the model correlates on it
    pub name: String,
    /// Result content (text or serialized JSON)
    pub content: String,
    /// Whether this result represents an error
    pub is_error: bool,
}

impl ToolResult {
    /// Successful result for `call`.
    pub fn success(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Failed result for `call`; the error text goes to the model verbatim.
    pub fn failure(call: &ToolCall, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: message.into(),
            is_error: true,
        }
    }
}

/// A locally executable tool.
///
/// Tools are object-safe, Send + Sync, and async. The returned string is the
/// text the tool provider wraps into its `content` block.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's definition (name, description, JSON Schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON input.
    async fn execute(&self, input: Value) -> Result<String, ToolError>;
}

/// Something that can list tools and run them by name.
///
/// The agentic loop only talks to this seam: a local [`ToolRegistry`]
/// executes in-process, an MCP client forwards every call to a remote
/// tool provider.
///
/// [`ToolRegistry`]: crate::registry::ToolRegistry
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tool catalog to advertise to the model.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run the named tool. Unknown names are reported as errors, not panics.
    async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    /// The tool provider answered with a JSON-RPC error object.
    #[error("{message} (code {code})")]
    Remote { code: i64, message: String },
    /// The tool provider could not be reached or answered garbage.
    #[error("Tool provider unavailable: {0}")]
    Unavailable(String),
}

/// Simple echo tool for testing purposes.
#[cfg(any(test, feature = "test-utils"))]
pub struct EchoTool;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".to_string(),
            description: "Echoes back the input message. For testing.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The message to echo back"
                    }
                },
                "required": ["message"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<String, ToolError> {
        let message = input
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'message' field".to_string()))?;
        Ok(message.to_string())
    }
}
