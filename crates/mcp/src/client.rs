//! MCP client implementation.
//!
//! Performs the handshake over an [`RpcTransport`], discovers the provider's
//! tools and forwards calls to it. `McpClient` implements `ToolExecutor`, so
//! the agentic loop can run remote tools without knowing where they live.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use finder_tool_runtime::{ToolDefinition, ToolError, ToolExecutor};

use crate::client_transport::RpcTransport;
use crate::error::McpError;
use crate::types::*;

const CLIENT_NAME: &str = "human-finder-client";

/// An MCP client bound to one tool provider.
pub struct McpClient {
    transport: Arc<dyn RpcTransport>,
    next_id: AtomicI64,
    server_info: Option<ServerInfo>,
    tools: Vec<ToolInfo>,
}

impl McpClient {
    /// Connect over `transport`: `initialize`, the `notifications/initialized`
    /// notification, then `tools/list`.
    pub async fn connect(transport: Arc<dyn RpcTransport>) -> Result<Self, McpError> {
        let mut client = Self {
            transport,
            next_id: AtomicI64::new(1),
            server_info: None,
            tools: Vec::new(),
        };

        client.initialize().await?;
        client.tools = client.list_tools().await?;
        tracing::info!(
            transport = client.transport.kind(),
            tools = client.tools.len(),
            "MCP client ready"
        );
        Ok(client)
    }

    /// Send one request and unwrap its result.
    ///
    /// A response with another id, or with neither result nor error, is a
    /// transport failure. An error object becomes [`McpError::Rpc`].
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = RpcId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = JsonRpcRequest::new(id.clone(), method, params);
        tracing::debug!(method = %method, id = ?id, "Sending request");

        let response = self.transport.request(&request).await?;

        if response.id != id {
            return Err(McpError::IdMismatch {
                expected: format!("{id:?}"),
                actual: format!("{:?}", response.id),
            });
        }
        if let Some(err) = response.error {
            return Err(McpError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        response
            .result
            .ok_or_else(|| McpError::InvalidResponse(format!("'{method}' returned no result")))
    }

    async fn initialize(&mut self) -> Result<(), McpError> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: serde_json::json!({}),
            client_info: ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
        };

        let result = self
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let init: InitializeResult = serde_json::from_value(result)?;
        if init.protocol_version != PROTOCOL_VERSION {
            tracing::warn!(
                server = %init.protocol_version,
                client = PROTOCOL_VERSION,
                "Protocol version differs"
            );
        }
        self.server_info = Some(init.server_info);

        self.transport
            .notify(&JsonRpcNotification::new("notifications/initialized", None))
            .await?;
        tracing::info!("MCP client initialized");
        Ok(())
    }

    /// Ask the provider for its catalog.
    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>, McpError> {
        let result = self.request("tools/list", None).await?;
        let list: ListToolsResult = serde_json::from_value(result)?;
        for tool in &list.tools {
            tracing::debug!(name = %tool.name, "Discovered tool");
        }
        Ok(list.tools)
    }

    /// Call a tool on the provider.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let result = self
            .request("tools/call", Some(serde_json::to_value(params)?))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Tools discovered at connect time, in provider order.
    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    pub async fn shutdown(&self) -> Result<(), McpError> {
        self.transport.shutdown().await
    }
}

#[async_trait]
impl ToolExecutor for McpClient {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().cloned().map(ToolDefinition::from).collect()
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        match self.call_tool(name, arguments).await {
            Ok(result) if result.is_error => Err(ToolError::ExecutionFailed(result.joined_text())),
            Ok(result) => Ok(result.joined_text()),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Remote tool call failed");
                Err(e.into())
            }
        }
    }
}
