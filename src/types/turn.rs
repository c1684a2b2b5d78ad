use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::ChatMessage;

/// Text recorded in place of a reply when the chat endpoint fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Who authored a turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The person typing.
    User,

    /// The bot.
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// The author.
    pub role: ChatRole,

    /// The message text.
    pub content: String,

    /// When the turn was recorded locally.
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,

    /// Set on the assistant turn recorded when the chat endpoint failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl Turn {
    /// A turn stamped with the current time.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: OffsetDateTime::now_utc(),
            fallback: false,
        }
    }

    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// The assistant turn that stands in for a failed reply.
    pub fn fallback() -> Self {
        Self {
            fallback: true,
            ..Self::assistant(FALLBACK_REPLY)
        }
    }

    /// The wire form of this turn: role and content, no timestamp.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_turn() {
        let turn = Turn::fallback();
        assert_eq!(turn.role, ChatRole::Assistant);
        assert_eq!(turn.content, FALLBACK_REPLY);
        assert!(turn.fallback);
        assert!(!Turn::assistant(FALLBACK_REPLY).fallback);
    }

    #[test]
    fn wire_form_strips_timestamp() {
        let json = serde_json::to_value(Turn::user("hello").to_message()).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn fallback_marker_only_serialized_when_set() {
        let plain = serde_json::to_value(Turn::assistant("hi")).unwrap();
        assert!(plain.get("fallback").is_none());
        let failed = serde_json::to_value(Turn::fallback()).unwrap();
        assert_eq!(failed["fallback"], true);
        let back: Turn = serde_json::from_value(plain).unwrap();
        assert!(!back.fallback);
    }
}
