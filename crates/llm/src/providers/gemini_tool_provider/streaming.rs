//! [`ToolAwareLlmProvider`] trait implementation for the Gemini streaming API.

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tracing::debug;

use finder_core::config::LlmConfig;
use finder_core::ConfigError;
use finder_tool_runtime::{
    conversation::ConversationMessage,
    provider::{EventStream, LlmError, ToolAwareLlmProvider},
    stream::StreamEvent,
    tool::ToolDefinition,
};

use super::sse::{ChunkParser, SseDecoder};
use super::translate::build_request_body;

/// Gemini provider with streaming function-calling support.
///
/// Uses `models/{model}:streamGenerateContent?alt=sse` to emit incremental
/// [`StreamEvent`]s that the agentic loop can consume.
pub struct GeminiToolProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiToolProvider {
    /// Create a new Gemini tool provider.
    ///
    /// # Arguments
    /// * `api_key` - Gemini API key
    /// * `model` - Model name (e.g. `"gemini-3-flash-preview"`)
    /// * `base_url` - API base URL (e.g. `"https://generativelanguage.googleapis.com"`)
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build from config; fails when no API key is set.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(
            api_key.to_string(),
            config.model.clone(),
            config.base_url.clone(),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

/// Map a non-success HTTP status to an [`LlmError`].
pub(super) fn status_error(status: u16, body_text: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthError,
        429 => {
            // RetryInfo, when present, carries a delay like "17s".
            let retry_after_secs = serde_json::from_str::<Value>(&body_text)
                .ok()
                .and_then(|v| {
                    v["error"]["details"].as_array().and_then(|details| {
                        details.iter().find_map(|d| {
                            d["retryDelay"]
                                .as_str()
                                .and_then(|s| s.trim_end_matches('s').parse::<f64>().ok())
                        })
                    })
                })
                .map(|secs| secs.ceil() as u64)
                .unwrap_or(30);
            LlmError::RateLimited { retry_after_secs }
        }
        _ => {
            let message = serde_json::from_str::<Value>(&body_text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or(body_text);
            LlmError::ApiError { status, message }
        }
    }
}

/// Decode an SSE body into provider events.
///
/// Always ends with exactly one `MessageEnd`, synthesized if the body
/// stops without a `finishReason`.
pub(super) fn decode_event_stream<S, E>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    struct State<S> {
        bytes: Pin<Box<S>>,
        decoder: SseDecoder,
        parser: ChunkParser,
        pending: VecDeque<StreamEvent>,
        done: bool,
    }

    let state = State {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        parser: ChunkParser::new(),
        pending: VecDeque::new(),
        done: false,
    };

    let events = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(evt) = state.pending.pop_front() {
                return Some((Ok(evt), state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for data in state.decoder.push(&chunk) {
                        let parsed = state.parser.parse(&data);
                        state.pending.extend(parsed);
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(LlmError::StreamError(e.to_string())), state));
                }
                None => {
                    state.done = true;
                    if let Some(data) = state.decoder.finish() {
                        let parsed = state.parser.parse(&data);
                        state.pending.extend(parsed);
                    }
                    if let Some(end) = state.parser.finish() {
                        state.pending.push_back(end);
                    }
                }
            }
        }
    });

    Box::pin(events)
}

#[async_trait]
impl ToolAwareLlmProvider for GeminiToolProvider {
    async fn stream_with_tools(
        &self,
        messages: Vec<ConversationMessage>,
        system_prompt: Option<String>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<EventStream, LlmError> {
        let url = self.stream_url();
        let body = build_request_body(
            &messages,
            system_prompt.as_deref(),
            &tools,
            temperature,
            max_tokens,
        );

        debug!(
            model = %self.model,
            turns = messages.len(),
            tools = tools.len(),
            "starting Gemini streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, body_text));
        }

        Ok(decode_event_stream(response.bytes_stream()))
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}
