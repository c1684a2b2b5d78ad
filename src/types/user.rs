use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// The authenticated user's profile, as returned by `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-side identifier.  Emitted as `_id` or `id`, string or number.
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,

    /// Login email address.
    pub email: String,

    /// Display name shown in the chat header.
    pub username: String,

    /// Whether the account is active.
    pub is_active: bool,

    /// Whether the email address has been verified.
    pub is_verified: bool,

    /// When the account was created.
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// The name to greet this user by.
    pub fn display_name(&self) -> &str {
        &self.username
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(id) => id,
        Id::Number(id) => id.to_string(),
    })
}
