//! Translation between provider-agnostic conversation types and the Gemini API format.

use serde_json::{json, Value};

use finder_tool_runtime::{conversation::ConversationMessage, tool::ToolDefinition};

use crate::schema::translate_schema;

/// Translate tool definitions into Gemini's `tools` array: one entry holding
/// every function declaration.
pub(super) fn tools_to_gemini(tools: &[ToolDefinition]) -> Value {
    let declarations: Vec<Value> = tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": translate_schema(&tool.input_schema),
            })
        })
        .collect();
    json!([{ "functionDeclarations": declarations }])
}

/// Translate a [`ConversationMessage`] into a Gemini `Content` object.
pub(super) fn message_to_gemini(msg: &ConversationMessage) -> Value {
    match msg {
        ConversationMessage::User(text) => json!({
            "role": "user",
            "parts": [{ "text": text }],
        }),
        ConversationMessage::Assistant(content) => {
            let mut parts: Vec<Value> = Vec::new();
            if let Some(text) = &content.text {
                parts.push(json!({ "text": text }));
            }
            for tc in &content.tool_calls {
                let mut part = json!({
                    "functionCall": {
                        "name": tc.name,
                        "args": tc.input,
                    }
                });
                if let Some(signature) = &tc.thought_signature {
                    part["thoughtSignature"] = json!(signature);
                }
                parts.push(part);
            }
            if parts.is_empty() {
                // Gemini rejects a content with no parts.
                parts.push(json!({ "text": "" }));
            }
            json!({
                "role": "model",
                "parts": parts,
            })
        }
        // All responses of one model turn go back as a single content,
        // correlated to their calls by function name.
        ConversationMessage::ToolResults(results) => {
            let parts: Vec<Value> = results
                .iter()
                .map(|r| {
                    let response = if r.is_error {
                        json!({ "error": r.content })
                    } else {
                        json!({ "result": r.content })
                    };
                    json!({
                        "functionResponse": {
                            "name": r.name,
                            "response": response,
                        }
                    })
                })
                .collect();
            json!({
                "role": "user",
                "parts": parts,
            })
        }
    }
}

/// Full `streamGenerateContent` request body.
pub(super) fn build_request_body(
    messages: &[ConversationMessage],
    system_prompt: Option<&str>,
    tools: &[ToolDefinition],
    temperature: f32,
    max_tokens: u32,
) -> Value {
    let contents: Vec<Value> = messages.iter().map(message_to_gemini).collect();

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "temperature": temperature,
            "maxOutputTokens": max_tokens,
        },
    });

    if !tools.is_empty() {
        body["tools"] = tools_to_gemini(tools);
    }

    if let Some(system) = system_prompt {
        body["system_instruction"] = json!({
            "parts": [{ "text": system }],
        });
    }

    body
}
