//! Unit tests for the Gemini tool provider.

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use serde_json::{json, Value};

use finder_tool_runtime::conversation::{AssistantContent, ConversationMessage};
use finder_tool_runtime::provider::{LlmError, ToolAwareLlmProvider};
use finder_tool_runtime::stream::{StopReason, StreamEvent};
use finder_tool_runtime::tool::{ToolCall, ToolDefinition, ToolResult};

use super::sse::{ChunkParser, SseDecoder};
use super::streaming::{decode_event_stream, status_error, GeminiToolProvider};
use super::translate::{build_request_body, message_to_gemini, tools_to_gemini};

fn call(id: &str, name: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        input: json!({}),
        thought_signature: None,
    }
}

async fn collect(bytes: Vec<&'static str>) -> Vec<StreamEvent> {
    let chunks = bytes
        .into_iter()
        .map(|s| Ok::<_, std::io::Error>(bytes::Bytes::from_static(s.as_bytes())));
    decode_event_stream(futures::stream::iter(chunks))
        .map(|e| e.unwrap())
        .collect()
        .await
}

// ── translation ─────────────────────────────────────────────────────

#[test]
fn test_tool_declarations() {
    let def = ToolDefinition {
        name: "get_humans".to_string(),
        description: "Returns all humans from the database".to_string(),
        input_schema: json!({"type": "object", "properties": {}}),
    };

    let tools = tools_to_gemini(&[def]);
    let decls = tools[0]["functionDeclarations"].as_array().unwrap();
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0]["name"], "get_humans");
    assert_eq!(decls[0]["description"], "Returns all humans from the database");
    assert_eq!(decls[0]["parameters"], json!({"type": "OBJECT", "properties": {}}));
}

#[test]
fn test_user_message_translation() {
    let msg = ConversationMessage::User("I am a cat, which human is best for me?".to_string());
    let gemini = message_to_gemini(&msg);

    assert_eq!(gemini["role"], "user");
    assert_eq!(gemini["parts"][0]["text"], "I am a cat, which human is best for me?");
}

#[test]
fn test_assistant_mixed_content_translation() {
    let msg = ConversationMessage::Assistant(AssistantContent {
        text: Some("Let me look.".to_string()),
        tool_calls: vec![ToolCall {
            id: "call_0".to_string(),
            name: "get_humans".to_string(),
            input: json!({"limit": 3}),
            thought_signature: None,
        }],
    });
    let gemini = message_to_gemini(&msg);

    assert_eq!(gemini["role"], "model");
    let parts = gemini["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["text"], "Let me look.");
    assert_eq!(parts[1]["functionCall"]["name"], "get_humans");
    assert_eq!(parts[1]["functionCall"]["args"]["limit"], 3);
}

#[test]
fn test_replayed_call_carries_thought_signature() {
    let mut parser = ChunkParser::new();
    let events = parser.parse(
        r#"{"candidates":[{"content":{"role":"model","parts":[
            {"functionCall":{"name":"get_humans","args":{}},"thoughtSignature":"SIG123"}
        ]},"finishReason":"STOP"}]}"#,
    );
    assert_eq!(
        events[0],
        StreamEvent::ToolCallStart {
            id: "call_0".to_string(),
            name: "get_humans".to_string(),
            thought_signature: Some("SIG123".to_string()),
        }
    );

    let signed = ToolCall {
        thought_signature: Some("SIG123".to_string()),
        ..call("call_0", "get_humans")
    };
    let msg = ConversationMessage::Assistant(AssistantContent {
        text: None,
        tool_calls: vec![signed, call("call_1", "get_humans")],
    });
    let gemini = message_to_gemini(&msg);

    let parts = gemini["parts"].as_array().unwrap();
    assert_eq!(parts[0]["thoughtSignature"], "SIG123");
    assert_eq!(parts[0]["functionCall"]["name"], "get_humans");
    assert!(parts[1].get("thoughtSignature").is_none());
}

#[test]
fn test_empty_assistant_turn_keeps_one_part() {
    let msg = ConversationMessage::Assistant(AssistantContent {
        text: None,
        tool_calls: vec![],
    });
    let gemini = message_to_gemini(&msg);
    assert_eq!(gemini["parts"], json!([{"text": ""}]));
}

#[test]
fn test_tool_results_become_one_turn() {
    let first = call("call_0", "get_humans");
    let second = call("call_1", "get_weather");
    let msg = ConversationMessage::ToolResults(vec![
        ToolResult::success(&first, "[]"),
        ToolResult::failure(&second, "Tool error: Tool not found (code -32601)"),
    ]);
    let gemini = message_to_gemini(&msg);

    assert_eq!(gemini["role"], "user");
    let parts = gemini["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["functionResponse"]["name"], "get_humans");
    assert_eq!(parts[0]["functionResponse"]["response"], json!({"result": "[]"}));
    assert_eq!(parts[1]["functionResponse"]["name"], "get_weather");
    assert_eq!(
        parts[1]["functionResponse"]["response"]["error"],
        "Tool error: Tool not found (code -32601)"
    );
}

#[test]
fn test_request_body() {
    let body = build_request_body(
        &[ConversationMessage::User("hi".to_string())],
        Some("Be brief."),
        &[],
        0.2,
        512,
    );

    assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
    assert_eq!(body["system_instruction"]["parts"][0]["text"], "Be brief.");
    assert!(body.get("tools").is_none());
}

// ── SSE framing ─────────────────────────────────────────────────────

#[test]
fn test_decoder_splits_events_across_chunks() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.push(b"data: {\"a\"").is_empty());
    assert_eq!(decoder.push(b":1}\r\n\r\ndata: {\"b\":2}\n"), vec!["{\"a\":1}"]);
    assert_eq!(decoder.push(b"\n"), vec!["{\"b\":2}"]);
    assert_eq!(decoder.finish(), None);
}

#[test]
fn test_decoder_keeps_split_utf8_intact() {
    let mut decoder = SseDecoder::new();
    let bytes = "data: {\"text\":\"caf\u{e9}\"}\n\n".as_bytes();
    let split = bytes.len() - 5;
    assert!(decoder.push(&bytes[..split]).is_empty());
    let events = decoder.push(&bytes[split..]);
    assert_eq!(events, vec!["{\"text\":\"café\"}"]);
}

#[test]
fn test_decoder_flushes_unterminated_event() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.push(b": keep-alive\ndata: {\"x\":1}").is_empty());
    assert_eq!(decoder.finish().as_deref(), Some("{\"x\":1}"));
}

// ── chunk parsing ───────────────────────────────────────────────────

#[test]
fn test_text_chunk() {
    let mut parser = ChunkParser::new();
    let events = parser.parse(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"}]}}]}"#);
    assert_eq!(
        events,
        vec![StreamEvent::TextDelta {
            text: "Hello".to_string()
        }]
    );
}

#[test]
fn test_function_call_chunk_synthesizes_ids() {
    let mut parser = ChunkParser::new();
    let events = parser.parse(
        r#"{"candidates":[{"content":{"role":"model","parts":[
            {"functionCall":{"name":"get_humans","args":{}}},
            {"functionCall":{"name":"get_humans"}}
        ]},"finishReason":"STOP"}]}"#,
    );

    assert_eq!(events.len(), 7);
    assert_eq!(
        events[0],
        StreamEvent::ToolCallStart {
            id: "call_0".to_string(),
            name: "get_humans".to_string(),
            thought_signature: None,
        }
    );
    assert_eq!(
        events[1],
        StreamEvent::ToolCallDelta {
            id: "call_0".to_string(),
            arguments_delta: "{}".to_string()
        }
    );
    assert_eq!(events[2], StreamEvent::ToolCallEnd { id: "call_0".to_string() });
    assert_eq!(events[5], StreamEvent::ToolCallEnd { id: "call_1".to_string() });
    assert_eq!(
        events[6],
        StreamEvent::MessageEnd {
            stop_reason: StopReason::ToolUse
        }
    );
}

#[test]
fn test_finish_reasons() {
    let cases = [
        ("STOP", StopReason::EndTurn),
        ("MAX_TOKENS", StopReason::MaxTokens),
        ("SAFETY", StopReason::Blocked),
    ];
    for (reason, expected) in cases {
        let mut parser = ChunkParser::new();
        let data = json!({"candidates": [{"content": {"parts": []}, "finishReason": reason}]});
        let events = parser.parse(&data.to_string());
        assert_eq!(
            events.last(),
            Some(&StreamEvent::MessageEnd {
                stop_reason: expected
            })
        );
        assert!(parser.finish().is_none());
    }
}

#[test]
fn test_thought_parts_are_skipped() {
    let mut parser = ChunkParser::new();
    let events = parser.parse(
        r#"{"candidates":[{"content":{"parts":[{"text":"pondering","thought":true},{"text":"Answer"}]}}]}"#,
    );
    assert_eq!(
        events,
        vec![StreamEvent::TextDelta {
            text: "Answer".to_string()
        }]
    );
}

#[test]
fn test_error_chunk() {
    let mut parser = ChunkParser::new();
    let events = parser.parse(r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#);
    assert_eq!(
        events,
        vec![StreamEvent::Error {
            message: "The model is overloaded.".to_string()
        }]
    );
}

#[test]
fn test_blocked_prompt() {
    let mut parser = ChunkParser::new();
    let events = parser.parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], StreamEvent::Error { message } if message.contains("SAFETY")));
    assert_eq!(
        events[1],
        StreamEvent::MessageEnd {
            stop_reason: StopReason::Blocked
        }
    );
}

// ── event stream ────────────────────────────────────────────────────

#[tokio::test]
async fn test_event_stream_preserves_order() {
    let events = collect(vec![
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Alice \"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Walker\"}]},",
        "\"finishReason\":\"STOP\"}]}\n\n",
    ])
    .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::TextDelta {
                text: "Alice ".to_string()
            },
            StreamEvent::TextDelta {
                text: "Walker".to_string()
            },
            StreamEvent::MessageEnd {
                stop_reason: StopReason::EndTurn
            },
        ]
    );
}

#[tokio::test]
async fn test_event_stream_synthesizes_message_end() {
    let events = collect(vec![
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"functionCall\":{\"name\":\"get_humans\",\"args\":{}}}]}}]}",
    ])
    .await;

    assert_eq!(events.len(), 4);
    assert_eq!(
        events[3],
        StreamEvent::MessageEnd {
            stop_reason: StopReason::ToolUse
        }
    );
}

#[tokio::test]
async fn test_event_stream_transport_error() {
    let chunks = vec![
        Ok(bytes::Bytes::from_static(b"data: {\"candidates\":[]}\n\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ];
    let results: Vec<_> = decode_event_stream(futures::stream::iter(chunks)).collect().await;
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(LlmError::StreamError(_))));
}

// ── HTTP status mapping ─────────────────────────────────────────────

#[test]
fn test_status_errors() {
    assert!(matches!(status_error(401, String::new()), LlmError::AuthError));
    assert!(matches!(status_error(403, String::new()), LlmError::AuthError));

    let body = json!({"error": {"code": 429, "details": [{"retryDelay": "17s"}]}}).to_string();
    assert!(matches!(
        status_error(429, body),
        LlmError::RateLimited { retry_after_secs: 17 }
    ));

    let body = json!({"error": {"code": 400, "message": "API key not valid."}}).to_string();
    match status_error(400, body) {
        LlmError::ApiError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid.");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

// ── end to end against a local stand-in ─────────────────────────────

#[derive(Clone, Default)]
struct Seen {
    key: Arc<Mutex<Option<String>>>,
    body: Arc<Mutex<Option<Value>>>,
}

async fn fake_gemini(status: u16, sse_body: &'static str) -> (String, Seen) {
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    let seen = Seen::default();
    let handler_seen = seen.clone();
    let app = axum::Router::new()
        .route(
            "/v1beta/models/{action}",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, axum::Json(body): axum::Json<Value>| async move {
                    *seen.key.lock().unwrap() = headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    *seen.body.lock().unwrap() = Some(body);
                    (StatusCode::from_u16(status).unwrap(), sse_body)
                },
            ),
        )
        .with_state(handler_seen);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

#[tokio::test]
async fn test_streams_from_http_endpoint() {
    let (base_url, seen) = fake_gemini(
        200,
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}]},\"finishReason\":\"STOP\"}]}\r\n\r\n",
    )
    .await;
    let provider = GeminiToolProvider::new(
        "test-key".to_string(),
        "gemini-3-flash-preview".to_string(),
        format!("{base_url}/"),
    );

    let events = provider
        .complete_with_tools(
            vec![ConversationMessage::User("hello".to_string())],
            None,
            vec![],
            0.2,
            256,
        )
        .await
        .unwrap();

    assert_eq!(
        events,
        vec![
            StreamEvent::TextDelta {
                text: "Hi".to_string()
            },
            StreamEvent::MessageEnd {
                stop_reason: StopReason::EndTurn
            },
        ]
    );
    assert_eq!(seen.key.lock().unwrap().as_deref(), Some("test-key"));
    let body = seen.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
}

#[tokio::test]
async fn test_http_auth_failure() {
    let (base_url, _seen) = fake_gemini(401, "{}").await;
    let provider = GeminiToolProvider::new(
        "bad-key".to_string(),
        "gemini-3-flash-preview".to_string(),
        base_url,
    );

    let result = provider
        .stream_with_tools(vec![ConversationMessage::User("hello".to_string())], None, vec![], 0.2, 256)
        .await;
    assert!(matches!(result, Err(LlmError::AuthError)));
}
