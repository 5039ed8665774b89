use crate::tool::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};

/// A message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConversationMessage {
    /// User's text input
    User(String),
    /// Model response (may contain text and/or tool calls)
    Assistant(AssistantContent),
    /// Function responses answering every call of the preceding assistant turn
    ToolResults(Vec<ToolResult>),
}

/// Content from the model that can contain mixed text and tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantContent {
    /// Text blocks in the response
    pub text: Option<String>,
    /// Tool calls requested by the model, in emission order
    pub tool_calls: Vec<ToolCall>,
}

/// Where a conversation stands, judged from its last message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Last message is user input or tool results; the model speaks next.
    AwaitingModel,
    /// Last message is a model turn with calls that have no responses yet.
    AwaitingToolResult,
    /// Last message is a model turn without calls.
    Final,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("no tool calls are awaiting results")]
    NoPendingCalls,
    #[error("expected {expected} tool results, got {actual}")]
    ResultCountMismatch { expected: usize, actual: usize },
}

/// Append-only history of one prompt/answer exchange.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    /// System prompt (sent separately from the turns)
    system_prompt: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn add_user_message(&mut self, text: String) {
        self.messages.push(ConversationMessage::User(text));
    }

    pub fn add_assistant_response(&mut self, content: AssistantContent) {
        self.messages.push(ConversationMessage::Assistant(content));
    }

    /// Append the responses to the pending calls as a single turn.
    ///
    /// There must be exactly one result per call of the last assistant turn.
    pub fn add_tool_results(&mut self, results: Vec<ToolResult>) -> Result<(), ConversationError> {
        let expected = self.pending_tool_calls().len();
        if expected == 0 {
            return Err(ConversationError::NoPendingCalls);
        }
        if results.len() != expected {
            return Err(ConversationError::ResultCountMismatch {
                expected,
                actual: results.len(),
            });
        }
        self.messages.push(ConversationMessage::ToolResults(results));
        Ok(())
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn state(&self) -> TurnState {
        match self.messages.last() {
            Some(ConversationMessage::Assistant(content)) if content.tool_calls.is_empty() => {
                TurnState::Final
            }
            Some(ConversationMessage::Assistant(_)) => TurnState::AwaitingToolResult,
            _ => TurnState::AwaitingModel,
        }
    }

    /// Calls of the last assistant turn when it still awaits results.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match self.messages.last() {
            Some(ConversationMessage::Assistant(content)) => &content.tool_calls,
            _ => &[],
        }
    }

    /// Text of the final model turn, if the conversation has one.
    pub fn final_text(&self) -> Option<&str> {
        match (self.state(), self.messages.last()) {
            (TurnState::Final, Some(ConversationMessage::Assistant(content))) => {
                Some(content.text.as_deref().unwrap_or(""))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolCall;

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input: serde_json::json!({}),
            thought_signature: None,
        }
    }

    #[test]
    fn test_conversation_basic() {
        let mut conv = Conversation::new();
        assert_eq!(conv.state(), TurnState::AwaitingModel);
        conv.add_user_message("Hello".to_string());
        conv.add_assistant_response(AssistantContent {
            text: Some("Hi there!".to_string()),
            tool_calls: vec![],
        });

        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.state(), TurnState::Final);
        assert_eq!(conv.final_text(), Some("Hi there!"));
    }

    #[test]
    fn test_conversation_with_tool_calls() {
        let mut conv = Conversation::new();
        conv.add_user_message("Which human suits a cat?".to_string());
        conv.add_assistant_response(AssistantContent {
            text: None,
            tool_calls: vec![call("call_1", "get_humans")],
        });
        assert_eq!(conv.state(), TurnState::AwaitingToolResult);
        assert_eq!(conv.final_text(), None);

        let c = call("call_1", "get_humans");
        conv.add_tool_results(vec![ToolResult::success(&c, "[]")]).unwrap();

        assert_eq!(conv.messages().len(), 3);
        assert_eq!(conv.state(), TurnState::AwaitingModel);
    }

    #[test]
    fn test_tool_results_must_answer_every_call() {
        let mut conv = Conversation::new();
        conv.add_user_message("hi".to_string());
        let a = call("a", "get_humans");
        let b = call("b", "get_humans");
        conv.add_assistant_response(AssistantContent {
            text: None,
            tool_calls: vec![a.clone(), b],
        });

        let err = conv
            .add_tool_results(vec![ToolResult::success(&a, "[]")])
            .unwrap_err();
        assert_eq!(
            err,
            ConversationError::ResultCountMismatch { expected: 2, actual: 1 }
        );
        assert_eq!(conv.state(), TurnState::AwaitingToolResult);
    }

    #[test]
    fn test_tool_results_without_pending_calls() {
        let mut conv = Conversation::new();
        conv.add_user_message("hi".to_string());
        let c = call("x", "get_humans");
        assert_eq!(
            conv.add_tool_results(vec![ToolResult::success(&c, "[]")]),
            Err(ConversationError::NoPendingCalls)
        );
    }

    #[test]
    fn test_final_text_defaults_to_empty() {
        let mut conv = Conversation::new();
        conv.add_user_message("hi".to_string());
        conv.add_assistant_response(AssistantContent {
            text: None,
            tool_calls: vec![],
        });
        assert_eq!(conv.final_text(), Some(""));
    }
}
