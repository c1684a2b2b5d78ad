use serde::{Deserialize, Serialize};

use crate::types::ChatRole;

/// A prior turn as the chat endpoint sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The author.
    pub role: ChatRole,
    /// The message text.
    pub content: String,
}

/// Body of `POST /api/chat/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The new user message.
    pub message: String,

    /// Every turn recorded before `message`, oldest first.
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Create a new chat request.
    pub fn new(message: impl Into<String>, conversation_history: Vec<ChatMessage>) -> Self {
        Self {
            message: message.into(),
            conversation_history,
        }
    }
}

/// Body of a successful `POST /api/chat/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub response: String,

    /// Server-assigned conversation identifier, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_request() {
        let request = ChatRequest::new(
            "how are you?",
            vec![
                ChatMessage {
                    role: ChatRole::User,
                    content: "hello".to_string(),
                },
                ChatMessage {
                    role: ChatRole::Assistant,
                    content: "hi".to_string(),
                },
            ],
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "how are you?",
                "conversation_history": [
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn deserialize_response() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "response": "hi",
            "conversation_id": "conv_1_2"
        }))
        .unwrap();
        assert_eq!(response.response, "hi");
        assert_eq!(response.conversation_id.as_deref(), Some("conv_1_2"));

        let bare: ChatResponse =
            serde_json::from_value(serde_json::json!({"response": "hi"})).unwrap();
        assert!(bare.conversation_id.is_none());
    }
}
