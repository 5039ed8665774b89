//! Agent wiring: reach the tool provider, build the loop, render its events.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, info};

use finder_core::{Config, TransportKind};
use finder_mcp::{HttpTransport, McpClient, ProcessTransport, RpcTransport};
use finder_tool_runtime::{
    AgenticLoop, AgenticLoopError, Conversation, StreamEvent, ToolAwareLlmProvider, ToolExecutor,
};

/// Open the configured binding and complete the MCP handshake.
pub async fn connect_tools(config: &Config, kind: TransportKind) -> anyhow::Result<Arc<McpClient>> {
    let mcp = &config.mcp;
    let transport: Arc<dyn RpcTransport> = match kind {
        TransportKind::Stdio => Arc::new(
            ProcessTransport::spawn(&mcp.server_command, &mcp.server_args)
                .with_context(|| format!("Failed to start '{}'", mcp.server_command))?,
        ),
        TransportKind::Http => Arc::new(
            HttpTransport::new(mcp.server_url.clone(), mcp.timeout())
                .context("Failed to build HTTP client")?,
        ),
    };

    let client = McpClient::connect(transport)
        .await
        .context("MCP handshake with the tool provider failed")?;
    info!(
        tools = ?client.tools().iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        "Discovered tools"
    );
    Ok(Arc::new(client))
}

/// The configured loop plus the per-conversation settings.
pub struct Agent {
    agentic_loop: AgenticLoop,
    system_prompt: Option<String>,
}

impl Agent {
    pub fn new(agentic_loop: AgenticLoop) -> Self {
        Self {
            agentic_loop,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    fn conversation(&self) -> Conversation {
        match &self.system_prompt {
            Some(prompt) => Conversation::new().with_system_prompt(prompt.clone()),
            None => Conversation::new(),
        }
    }
}

pub fn build_agent(
    config: &Config,
    provider: Arc<dyn ToolAwareLlmProvider>,
    tools: Arc<dyn ToolExecutor>,
) -> Agent {
    let agentic_loop = AgenticLoop::new(provider, tools)
        .with_max_iterations(config.agent.max_iterations)
        .with_temperature(config.llm.temperature)
        .with_max_tokens(config.llm.max_tokens);
    Agent::new(agentic_loop).with_system_prompt(config.agent.system_prompt.clone())
}

/// Text shown to the user for one loop event, if any.
///
/// Model text passes through verbatim; tool calls and failed tool results
/// become progress markers on their own lines.
pub fn render_event(event: &StreamEvent) -> Option<String> {
    match event {
        StreamEvent::TextDelta { text } => Some(text.clone()),
        StreamEvent::ToolCallStart { name, .. } => {
            Some(format!("\n--- calling tool: {} ---\n", name))
        }
        StreamEvent::ToolResult {
            name,
            is_error: true,
            ..
        } => Some(format!("--- tool {} failed ---\n", name)),
        StreamEvent::ToolCallDelta { .. }
        | StreamEvent::ToolCallEnd { .. }
        | StreamEvent::ToolResult { .. }
        | StreamEvent::MessageEnd { .. }
        // Surfaces as the turn's error once the stream ends.
        | StreamEvent::Error { .. } => None,
    }
}

/// Answer `prompt` in a fresh conversation, sending rendered chunks to `out`
/// as they arrive.
///
/// A dropped `out` receiver does not stop the loop.
pub async fn stream_answer(
    agent: &Agent,
    prompt: String,
    out: &mpsc::Sender<String>,
) -> Result<String, AgenticLoopError> {
    let (tx, mut rx) = mpsc::channel::<StreamEvent>(64);
    let mut conversation = agent.conversation();

    let run = agent
        .agentic_loop
        .run_streaming(&mut conversation, prompt, tx);
    let forward = async {
        while let Some(event) = rx.recv().await {
            if let Some(chunk) = render_event(&event) {
                if out.send(chunk).await.is_err() {
                    debug!("Output receiver dropped");
                }
            }
        }
    };

    let (result, ()) = tokio::join!(run, forward);
    result
}
