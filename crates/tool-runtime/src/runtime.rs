use crate::conversation::{AssistantContent, Conversation, ConversationError, TurnState};
use crate::provider::{LlmError, ToolAwareLlmProvider};
use crate::stream::StreamEvent;
use crate::tool::{ToolCall, ToolExecutor, ToolResult};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The core agentic loop that orchestrates LLM ↔ Tool execution.
///
/// Flow: User → LLM → ToolCalls → Execute → Results → LLM → ... → Final Text
///
/// Tool calls of one model turn run one at a time, in the order the model
/// emitted them, and their results go back as a single turn.
pub struct AgenticLoop {
    provider: Arc<dyn ToolAwareLlmProvider>,
    tools: Arc<dyn ToolExecutor>,
    max_iterations: usize,
    temperature: f32,
    max_tokens: u32,
}

impl AgenticLoop {
    pub fn new(provider: Arc<dyn ToolAwareLlmProvider>, tools: Arc<dyn ToolExecutor>) -> Self {
        Self {
            provider,
            tools,
            max_iterations: 10,
            temperature: 0.2,
            max_tokens: 4096,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Run a single user turn through the loop and return the final text.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        user_message: String,
    ) -> Result<String, AgenticLoopError> {
        self.drive(conversation, user_message, None).await
    }

    /// Like [`run`](Self::run), forwarding every event to `tx` as it arrives.
    ///
    /// A closed receiver is ignored: the loop, including any tool calls
    /// already requested, runs to completion regardless.
    pub async fn run_streaming(
        &self,
        conversation: &mut Conversation,
        user_message: String,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<String, AgenticLoopError> {
        self.drive(conversation, user_message, Some(&tx)).await
    }

    async fn drive(
        &self,
        conversation: &mut Conversation,
        user_message: String,
        tx: Option<&mpsc::Sender<StreamEvent>>,
    ) -> Result<String, AgenticLoopError> {
        conversation.add_user_message(user_message);
        let tools = self.tools.definitions();

        for iteration in 0..self.max_iterations {
            debug!(iteration, provider = self.provider.provider_name(), "Starting agentic loop iteration");

            let mut stream = self
                .provider
                .stream_with_tools(
                    conversation.messages().to_vec(),
                    conversation.system_prompt().map(String::from),
                    tools.clone(),
                    self.temperature,
                    self.max_tokens,
                )
                .await?;

            let mut text_parts = Vec::new();
            let mut tool_calls: Vec<ToolCall> = Vec::new();
            let mut current_tool_args = String::new();
            let mut current_tool_id = String::new();
            let mut current_tool_name = String::new();
            let mut current_tool_signature: Option<String> = None;
            let mut stream_error: Option<String> = None;

            while let Some(event_result) = stream.next().await {
                let event = event_result?;
                match &event {
                    StreamEvent::TextDelta { text } => {
                        text_parts.push(text.clone());
                    }
                    StreamEvent::ToolCallStart {
                        id,
                        name,
                        thought_signature,
                    } => {
                        current_tool_id = id.clone();
                        current_tool_name = name.clone();
                        current_tool_signature = thought_signature.clone();
                        current_tool_args.clear();
                    }
                    StreamEvent::ToolCallDelta { arguments_delta, .. } => {
                        current_tool_args.push_str(arguments_delta);
                    }
                    StreamEvent::ToolCallEnd { .. } => {
                        tool_calls.push(ToolCall {
                            id: current_tool_id.clone(),
                            name: current_tool_name.clone(),
                            input: parse_arguments(&current_tool_name, &current_tool_args),
                            thought_signature: current_tool_signature.take(),
                        });
                    }
                    StreamEvent::Error { message } => {
                        warn!(message, "Stream error");
                        stream_error.get_or_insert_with(|| message.clone());
                    }
                    StreamEvent::MessageEnd { .. } | StreamEvent::ToolResult { .. } => {}
                }
                emit(tx, event).await;
            }

            // A model failure reported inside the stream ends the conversation.
            if let Some(message) = stream_error {
                return Err(LlmError::StreamError(message).into());
            }

            let text = if text_parts.is_empty() {
                None
            } else {
                Some(text_parts.concat())
            };
            let done = tool_calls.is_empty();
            conversation.add_assistant_response(AssistantContent {
                text: text.clone(),
                tool_calls: tool_calls.clone(),
            });

            if done {
                debug_assert_eq!(conversation.state(), TurnState::Final);
                info!(iteration, "Agentic loop complete (no tool calls)");
                return Ok(text.unwrap_or_default());
            }

            info!(count = tool_calls.len(), "Executing tool calls");
            let results = self.execute_tool_calls(&tool_calls, tx).await;
            conversation.add_tool_results(results)?;
        }

        warn!(max = self.max_iterations, "Agentic loop hit its iteration bound");
        Err(AgenticLoopError::MaxIterations(self.max_iterations))
    }

    /// Execute calls sequentially; failures become error-flagged results.
    async fn execute_tool_calls(
        &self,
        tool_calls: &[ToolCall],
        tx: Option<&mpsc::Sender<StreamEvent>>,
    ) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            info!(tool = %call.name, id = %call.id, "Calling tool");
            let result = match self.tools.call(&call.name, call.input.clone()).await {
                Ok(content) => ToolResult::success(call, content),
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool call failed");
                    ToolResult::failure(call, format!("Tool error: {}", e))
                }
            };
            emit(
                tx,
                StreamEvent::ToolResult {
                    id: result.tool_call_id.clone(),
                    name: result.name.clone(),
                    is_error: result.is_error,
                },
            )
            .await;
            results.push(result);
        }

        results
    }
}

fn parse_arguments(tool: &str, raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(tool, error = %e, "Unparseable tool arguments, sending empty object");
        serde_json::json!({})
    })
}

async fn emit(tx: Option<&mpsc::Sender<StreamEvent>>, event: StreamEvent) {
    if let Some(tx) = tx {
        if tx.send(event).await.is_err() {
            debug!("Event receiver dropped");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgenticLoopError {
    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),
    #[error("Max iterations ({0}) exceeded")]
    MaxIterations(usize),
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}
