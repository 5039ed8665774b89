//! MCP server implementation.
//!
//! Wraps a `ToolRegistry` and exposes its tools over the MCP protocol.
//! Dispatch is transport-agnostic: the pipe binding drives [`McpServer::run`],
//! the HTTP binding calls [`McpServer::handle_message`] once per POST body.

use serde_json::Value;

use finder_tool_runtime::{ToolError, ToolRegistry};

use crate::error::McpError;
use crate::transport::McpTransport;
use crate::types::*;

/// MCP server that bridges a `ToolRegistry` to MCP clients.
///
/// Holds no per-session state, so one instance can serve concurrent
/// requests behind an `Arc`.
pub struct McpServer {
    registry: ToolRegistry,
    server_name: String,
    server_version: String,
}

impl McpServer {
    /// Create a new MCP server wrapping the given tool registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            server_name: "human-finder".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Run the server loop until the transport is closed.
    ///
    /// Lines that are not valid JSON-RPC are logged and skipped; a bad line
    /// never ends the session.
    pub async fn run<T: McpTransport>(&self, transport: &mut T) -> Result<(), McpError> {
        tracing::info!(server = %self.server_name, tools = self.registry.len(), "MCP server starting");

        while let Some(line) = transport.receive().await? {
            tracing::debug!(message = %line, "Received message");

            let response = match self.handle_message(&line).await {
                Ok(Some(response)) => response,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, raw = %line, "Dropping malformed message");
                    continue;
                }
            };

            let json = serde_json::to_string(&response)?;
            tracing::debug!(response = %json, "Sending response");
            transport.send(&json).await?;
        }

        tracing::info!("Transport closed, shutting down");
        Ok(())
    }

    /// Handle one raw message.
    ///
    /// Returns `Ok(None)` for notifications and ignored methods, and an
    /// error when the text is not a JSON-RPC message at all.
    pub async fn handle_message(&self, raw: &str) -> Result<Option<JsonRpcResponse>, McpError> {
        let value: Value = serde_json::from_str(raw)?;

        // No "id" means notification.
        if value.get("id").is_none() {
            let notif: JsonRpcNotification = serde_json::from_value(value)?;
            self.handle_notification(&notif);
            return Ok(None);
        }

        let request: JsonRpcRequest = serde_json::from_value(value)?;
        Ok(self.handle_request(&request).await)
    }

    /// Handle a single JSON-RPC request.
    ///
    /// Unrecognized methods are logged and produce no response.
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(id, &request.params)),
            "tools/list" => Some(self.handle_list_tools(id)),
            "tools/call" => Some(self.handle_call_tool(id, &request.params).await),
            method => {
                tracing::warn!(method = %method, "Received unknown method, not responding");
                None
            }
        }
    }

    fn handle_notification(&self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => {
                tracing::info!("Client confirmed initialization");
            }
            method => {
                tracing::debug!(method = %method, "Unknown notification, ignoring");
            }
        }
    }

    fn handle_initialize(&self, id: RpcId, params: &Option<Value>) -> JsonRpcResponse {
        let client = params
            .as_ref()
            .and_then(|p| serde_json::from_value::<InitializeParams>(p.clone()).ok())
            .map(|p| p.client_info.name)
            .unwrap_or_else(|| "unknown".to_string());
        tracing::info!(client = %client, "Handling initialize");

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: ServerInfo {
                name: self.server_name.clone(),
                version: Some(self.server_version.clone()),
            },
        };
        to_response(id, result)
    }

    fn handle_list_tools(&self, id: RpcId) -> JsonRpcResponse {
        tracing::debug!("Handling tools/list");
        let tools: Vec<ToolInfo> = self.registry.list().into_iter().map(ToolInfo::from).collect();
        to_response(id, ListToolsResult { tools })
    }

    async fn handle_call_tool(&self, id: RpcId, params: &Option<Value>) -> JsonRpcResponse {
        // Without a decodable name there is no tool to find.
        let Some(call_params) = params
            .as_ref()
            .and_then(|p| serde_json::from_value::<CallToolParams>(p.clone()).ok())
        else {
            tracing::warn!(params = ?params, "tools/call without a tool name");
            return error_response(id, McpError::ToolNotFound(String::new()));
        };

        tracing::debug!(tool = %call_params.name, "Handling tools/call");

        let Some(tool) = self.registry.get(&call_params.name) else {
            tracing::warn!(tool = %call_params.name, "Tool not found");
            return error_response(id, McpError::ToolNotFound(call_params.name));
        };

        match tool.execute(call_params.arguments).await {
            Ok(text) => to_response(id, CallToolResult::text(text)),
            Err(e) => {
                tracing::error!(tool = %call_params.name, error = %e, "Tool execution failed");
                let message = match e {
                    ToolError::ExecutionFailed(msg) => msg,
                    other => other.to_string(),
                };
                error_response(id, McpError::ToolExecution(message))
            }
        }
    }
}

fn to_response(id: RpcId, result: impl serde::Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(val) => JsonRpcResponse::success(id, val),
        Err(e) => error_response(id, McpError::ToolExecution(e.to_string())),
    }
}

fn error_response(id: RpcId, err: McpError) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(err.to_rpc_error()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use finder_humans::{GetHumansTool, Human, HumanStore};
    use finder_tool_runtime::tool::EchoTool;
    use finder_tool_runtime::{Tool, ToolDefinition};

    use crate::transport::ChannelTransport;

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "broken".to_string(),
                description: "Always fails".to_string(),
                input_schema: serde_json::json!({"type": "object", "properties": {}}),
            }
        }

        async fn execute(&self, _input: Value) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed("storage unreachable".to_string()))
        }
    }

    async fn humans_server() -> McpServer {
        let store = Arc::new(HumanStore::in_memory().await.unwrap());
        store.seed_humans().await.unwrap();
        let mut registry = ToolRegistry::new();
        registry.register(GetHumansTool::new(store)).unwrap();
        registry.register(BrokenTool).unwrap();
        McpServer::new(registry)
    }

    fn call(id: i64, name: &str) -> JsonRpcRequest {
        JsonRpcRequest::new(
            RpcId::Number(id),
            "tools/call",
            Some(serde_json::json!({"name": name, "arguments": {}})),
        )
    }

    #[tokio::test]
    async fn test_handle_initialize() {
        let server = humans_server().await;
        let req = JsonRpcRequest::new(
            RpcId::Number(1),
            "initialize",
            Some(serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "test-client"}
            })),
        );

        let resp = server.handle_request(&req).await.unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["capabilities"], serde_json::json!({"tools": {}}));
        assert_eq!(result["serverInfo"]["name"], "human-finder");
    }

    #[tokio::test]
    async fn test_get_humans_returns_ten_rows_in_order() {
        let server = humans_server().await;
        let resp = server.handle_request(&call(3, "get_humans")).await.unwrap();
        assert!(resp.error.is_none());

        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(!result.is_error);
        let humans: Vec<Human> = serde_json::from_str(&result.joined_text()).unwrap();
        assert_eq!(humans.len(), 10);
        assert_eq!(humans[0].first_name, "Alice");
        assert_eq!(humans[9].first_name, "Julia");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_method_not_found() {
        let server = humans_server().await;
        let resp = server.handle_request(&call(4, "nonexistent")).await.unwrap();
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(err.message, "Tool not found");
    }

    #[tokio::test]
    async fn test_call_without_usable_params_is_tool_not_found() {
        let server = humans_server().await;
        for params in [None, Some(serde_json::json!({"arguments": {}})), Some(serde_json::json!(42))] {
            let req = JsonRpcRequest::new(RpcId::Number(8), "tools/call", params);
            let resp = server.handle_request(&req).await.unwrap();
            assert_eq!(resp.id, RpcId::Number(8));
            assert!(resp.result.is_none());
            let err = resp.error.unwrap();
            assert_eq!(err.code, -32601);
            assert_eq!(err.message, "Tool not found");
        }
    }

    #[tokio::test]
    async fn test_json_that_is_not_rpc_is_parse_error() {
        let server = humans_server().await;
        let err = server.handle_message(r#"{"id": 1}"#).await.unwrap_err();
        assert_eq!(err.to_rpc_error().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_execution_failure_is_internal_error() {
        let server = humans_server().await;
        let resp = server.handle_request(&call(5, "broken")).await.unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::INTERNAL_ERROR);
        assert_eq!(err.message, "storage unreachable");
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let store = Arc::new(HumanStore::in_memory().await.unwrap());
        store.close().await;
        let mut registry = ToolRegistry::new();
        registry.register(GetHumansTool::new(store)).unwrap();
        let server = McpServer::new(registry);

        let resp = server.handle_request(&call(6, "get_humans")).await.unwrap();
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, -32603);
    }

    #[tokio::test]
    async fn test_tools_list_is_byte_identical() {
        let server = humans_server().await;
        let req = JsonRpcRequest::new(RpcId::Number(2), "tools/list", None);

        let first = serde_json::to_string(&server.handle_request(&req).await.unwrap()).unwrap();
        let second = serde_json::to_string(&server.handle_request(&req).await.unwrap()).unwrap();
        assert_eq!(first, second);

        let resp: JsonRpcResponse = serde_json::from_str(&first).unwrap();
        let result: ListToolsResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        let names: Vec<_> = result.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get_humans", "broken"]);
    }

    #[tokio::test]
    async fn test_unknown_method_gets_no_response() {
        let server = humans_server().await;
        let req = JsonRpcRequest::new(RpcId::Number(7), "resources/list", None);
        assert!(server.handle_request(&req).await.is_none());
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let server = humans_server().await;
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_malformed_message_is_parse_error() {
        let server = humans_server().await;
        let err = server.handle_message("{not json").await.unwrap_err();
        assert_eq!(err.to_rpc_error().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_server_run_with_channel_transport() {
        let (mut client_side, mut server_side) = ChannelTransport::pair();
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        let server = McpServer::new(registry);

        let server_handle = tokio::spawn(async move { server.run(&mut server_side).await });

        // Malformed line, notification and unknown method are all skipped.
        client_side.send("garbage").await.unwrap();
        client_side
            .send(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        client_side
            .send(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await
            .unwrap();

        let call_req = JsonRpcRequest::new(
            RpcId::Number(2),
            "tools/call",
            Some(serde_json::json!({
                "name": "echo",
                "arguments": {"message": "via transport"}
            })),
        );
        client_side
            .send(&serde_json::to_string(&call_req).unwrap())
            .await
            .unwrap();

        let resp_line = client_side.receive().await.unwrap().unwrap();
        let resp: JsonRpcResponse = serde_json::from_str(&resp_line).unwrap();
        assert_eq!(resp.id, RpcId::Number(2));
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.joined_text(), "via transport");

        drop(client_side);
        server_handle.await.unwrap().unwrap();
    }
}
