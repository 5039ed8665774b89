//! Gemini (Generative Language API) implementation of [`ToolAwareLlmProvider`].
//!
//! Supports streaming function calling via SSE, translating between the Gemini
//! `contents`/`parts` format and the provider-agnostic [`StreamEvent`] /
//! [`ConversationMessage`] types.
//!
//! [`ToolAwareLlmProvider`]: finder_tool_runtime::ToolAwareLlmProvider
//! [`StreamEvent`]: finder_tool_runtime::StreamEvent
//! [`ConversationMessage`]: finder_tool_runtime::ConversationMessage

mod sse;
mod streaming;
mod translate;

pub use self::streaming::GeminiToolProvider;

#[cfg(test)]
mod tests;
