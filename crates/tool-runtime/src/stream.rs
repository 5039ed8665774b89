use serde::{Deserialize, Serialize};

/// Events emitted while a model turn streams in, plus the loop's own
/// tool progress events.
/// Provider-agnostic — translated from the Gemini format in the provider layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of text from the model
    TextDelta {
        text: String,
    },
    /// Start of a tool call (model wants to execute a tool)
    ToolCallStart {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    /// Incremental JSON argument data for a tool call
    ToolCallDelta {
        id: String,
        arguments_delta: String,
    },
    /// Tool call arguments are complete
    ToolCallEnd {
        id: String,
    },
    /// The loop finished executing a tool call
    ToolResult {
        id: String,
        name: String,
        is_error: bool,
    },
    /// The entire model message is complete
    MessageEnd {
        stop_reason: StopReason,
    },
    /// An error occurred during streaming
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Normal end of response
    EndTurn,
    /// Model wants to use tools
    ToolUse,
    /// Hit max tokens limit
    MaxTokens,
    /// Withheld by the provider (safety, recitation, ...)
    Blocked,
}
