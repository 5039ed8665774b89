pub mod tool;
pub mod registry;
pub mod runtime;
pub mod provider;
pub mod conversation;
pub mod stream;

pub use tool::{Tool, ToolCall, ToolDefinition, ToolError, ToolExecutor, ToolResult};
pub use registry::ToolRegistry;
pub use runtime::{AgenticLoop, AgenticLoopError};
pub use provider::{LlmError, ToolAwareLlmProvider};
pub use conversation::{Conversation, ConversationMessage, TurnState};
pub use stream::{StopReason, StreamEvent};
