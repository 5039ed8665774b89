//! HTTP router construction.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

/// Build the tool provider's HTTP router.
pub fn build_router(state: Arc<AppState>, frontend_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/mcp", post(api::mcp_rpc))
        .route("/mcp_api/load_humans", get(api::load_humans))
        .layer(cors_layer(frontend_origins))
        .with_state(state)
}

/// CORS restricted to the configured front-end origins, credentials allowed.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    use finder_humans::{GetHumansTool, Human, HumanStore};
    use finder_mcp::{
        HttpTransport, JsonRpcRequest, McpClient, McpError, McpServer, RpcId, RpcTransport,
    };
    use finder_tool_runtime::ToolRegistry;

    use crate::api::HealthResponse;

    async fn test_app(seed: bool) -> Router {
        let store = Arc::new(HumanStore::in_memory().await.unwrap());
        if seed {
            store.seed_humans().await.unwrap();
        }
        let mut registry = ToolRegistry::new();
        registry.register(GetHumansTool::new(store.clone())).unwrap();
        let state = Arc::new(AppState {
            mcp: Arc::new(McpServer::new(registry)),
            store,
        });
        build_router(state, &["http://localhost:3000".to_string()])
    }

    fn rpc(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_app(false)
            .await
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn test_tools_call_over_http() {
        let response = test_app(true)
            .await
            .oneshot(rpc(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "get_humans", "arguments": {}}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], 3);
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let humans: Vec<Human> = serde_json::from_str(text).unwrap();
        assert_eq!(humans.len(), 10);
    }

    #[tokio::test]
    async fn test_unknown_tool_over_http() {
        let response = test_app(true)
            .await
            .oneshot(rpc(json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "nope", "arguments": {}}
            })))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32601);
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn test_ignored_method_is_no_content() {
        let app = test_app(false).await;

        let response = app
            .clone()
            .oneshot(rpc(json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(rpc(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_http_client_round_trip() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = test_app(true).await;
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let transport =
            Arc::new(HttpTransport::new(format!("http://{addr}/mcp"), Duration::from_secs(5)).unwrap());
        let client = McpClient::connect(transport.clone()).await.unwrap();

        assert_eq!(client.server_info().unwrap().name, "human-finder");
        let names: Vec<_> = client.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get_humans"]);

        let result = client.call_tool("get_humans", json!({})).await.unwrap();
        let humans: Vec<Human> = serde_json::from_str(&result.joined_text()).unwrap();
        assert_eq!(humans.len(), 10);

        let err = client.call_tool("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::Rpc { code: -32601, .. }));

        // 204 for an ignored method
        let ignored = JsonRpcRequest::new(RpcId::Number(99), "resources/list", None);
        let err = transport.request(&ignored).await.unwrap_err();
        assert!(matches!(err, McpError::NoResponse(ref method) if method == "resources/list"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = test_app(false)
            .await
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .body(Body::from("{oops"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_load_humans() {
        let response = test_app(true)
            .await
            .oneshot(
                Request::builder()
                    .uri("/mcp_api/load_humans")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let humans = body.as_array().unwrap();
        assert_eq!(humans.len(), 10);
        assert_eq!(humans[0]["firstName"], "Alice");
        assert!(humans[0].get("hasAllergies").is_some());
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_with_credentials() {
        let response = test_app(false)
            .await
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/mcp")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_rejects_unknown_origin() {
        let response = test_app(false)
            .await
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
