use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::ChatRole;

/// A message stored in a server-side conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// The author.
    pub role: ChatRole,
    /// The message text.
    pub content: String,
    /// When the server stored it.
    #[serde(default, with = "optional_time")]
    pub timestamp: Option<OffsetDateTime>,
}

/// A conversation listed by `GET /api/chat/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation identifier.
    #[serde(alias = "_id")]
    pub id: String,

    /// Optional title.
    #[serde(default)]
    pub title: Option<String>,

    /// Stored messages, oldest first.
    #[serde(default)]
    pub messages: Vec<StoredMessage>,

    /// When the conversation was created.
    #[serde(default, with = "optional_time")]
    pub created_at: Option<OffsetDateTime>,

    /// When the conversation was last changed.
    #[serde(default, with = "optional_time")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Body of `GET /api/chat/history`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationList {
    /// The listed conversations.
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

/// A bare `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Human-readable confirmation.
    pub message: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `healthy` when the API is up.
    pub status: String,
    /// Human-readable detail.
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    /// Whether the server reported itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

mod optional_time {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => crate::utils::time::parse(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }

    pub fn serialize<S>(datetime: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match datetime {
            Some(datetime) => crate::utils::time::serialize(datetime, serializer),
            None => serializer.serialize_none(),
        }
    }
}
