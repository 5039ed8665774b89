use crate::conversation::ConversationMessage;
use crate::stream::StreamEvent;
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Boxed stream of provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Trait for LLM providers that support tool use and streaming.
///
/// This trait lives in tool-runtime (not in crates/llm) because it's
/// defined by the consumer (the agentic loop), not the provider.
/// Implementations live in crates/llm.
#[async_trait]
pub trait ToolAwareLlmProvider: Send + Sync {
    /// Stream a response from the LLM with tool definitions available.
    async fn stream_with_tools(
        &self,
        messages: Vec<ConversationMessage>,
        system_prompt: Option<String>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<EventStream, LlmError>;

    /// Non-streaming convenience: collects the full response.
    async fn complete_with_tools(
        &self,
        messages: Vec<ConversationMessage>,
        system_prompt: Option<String>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Vec<StreamEvent>, LlmError> {
        use futures::StreamExt;
        let stream = self
            .stream_with_tools(messages, system_prompt, tools, temperature, max_tokens)
            .await?;
        let events: Vec<_> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// Provider name for logging/debugging (e.g., "gemini")
    fn provider_name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("Authentication failed")]
    AuthError,
    #[error("Stream error: {0}")]
    StreamError(String),
}

/// Scripted provider for testing the agentic loop without real API calls.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use crate::stream::StopReason;
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns queued responses in FIFO order and records every request.
    pub struct MockLlmProvider {
        responses: Mutex<VecDeque<Vec<StreamEvent>>>,
        requests: Mutex<Vec<Vec<ConversationMessage>>>,
        tools_seen: Mutex<Vec<Vec<ToolDefinition>>>,
    }

    impl MockLlmProvider {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                tools_seen: Mutex::new(Vec::new()),
            }
        }

        /// Queue a response returned after all previously queued ones.
        pub fn queue_response(&self, events: Vec<StreamEvent>) {
            self.responses.lock().unwrap().push_back(events);
        }

        /// Queue a plain text response.
        pub fn queue_text(&self, text: &str) {
            self.queue_response(vec![
                StreamEvent::TextDelta {
                    text: text.to_string(),
                },
                StreamEvent::MessageEnd {
                    stop_reason: StopReason::EndTurn,
                },
            ]);
        }

        /// Queue a turn requesting each `(name, arguments)` call in order.
        pub fn queue_tool_calls(&self, calls: &[(&str, serde_json::Value)]) {
            let mut events = Vec::new();
            for (i, (name, args)) in calls.iter().enumerate() {
                let id = format!("call_{}", i);
                events.push(StreamEvent::ToolCallStart {
                    id: id.clone(),
                    name: name.to_string(),
                    thought_signature: None,
                });
                events.push(StreamEvent::ToolCallDelta {
                    id: id.clone(),
                    arguments_delta: args.to_string(),
                });
                events.push(StreamEvent::ToolCallEnd { id });
            }
            events.push(StreamEvent::MessageEnd {
                stop_reason: StopReason::ToolUse,
            });
            self.queue_response(events);
        }

        /// Conversation snapshots passed to each call, in call order.
        pub fn requests(&self) -> Vec<Vec<ConversationMessage>> {
            self.requests.lock().unwrap().clone()
        }

        /// Tool catalogs passed to each call, in call order.
        pub fn tools_seen(&self) -> Vec<Vec<ToolDefinition>> {
            self.tools_seen.lock().unwrap().clone()
        }
    }

    impl Default for MockLlmProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ToolAwareLlmProvider for MockLlmProvider {
        async fn stream_with_tools(
            &self,
            messages: Vec<ConversationMessage>,
            _system_prompt: Option<String>,
            tools: Vec<ToolDefinition>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<EventStream, LlmError> {
            self.requests.lock().unwrap().push(messages);
            self.tools_seen.lock().unwrap().push(tools);
            let events = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    vec![StreamEvent::MessageEnd {
                        stop_reason: StopReason::EndTurn,
                    }]
                });
            Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
        }

        fn provider_name(&self) -> &str {
            "mock"
        }
    }
}
