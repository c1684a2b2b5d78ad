use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque bearer credential issued by `POST /api/auth/token`.
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value of an `Authorization` header carrying this token.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Body of a successful token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The issued credential.
    pub access_token: BearerToken,

    /// Token scheme; the server always says `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// The credential, if any, that one outgoing request carries.
///
/// Every call into the client takes one of these explicitly; there is no
/// process-wide default header.  The generation identifies which session
/// handed it out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    token: Option<BearerToken>,
    generation: u64,
}

impl RequestContext {
    /// A context that sends no credential.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A context carrying an optional credential.
    pub fn new(token: Option<BearerToken>, generation: u64) -> Self {
        Self { token, generation }
    }

    /// A context carrying `token`, stamped with the session generation.
    pub fn bearer(token: BearerToken, generation: u64) -> Self {
        Self {
            token: Some(token),
            generation,
        }
    }

    /// The attached credential.
    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// The session generation this context was created under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The `Authorization` header value, if a credential is attached.
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(BearerToken::authorization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let token = BearerToken::new("eyJhbGciOi.secret");
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("secret"));
        let context = RequestContext::bearer(token, 3);
        assert!(!format!("{:?}", context).contains("secret"));
    }

    #[test]
    fn authorization_header() {
        let context = RequestContext::bearer(BearerToken::new("abc"), 1);
        assert_eq!(context.authorization().as_deref(), Some("Bearer abc"));
        assert_eq!(context.generation(), 1);
        assert_eq!(RequestContext::anonymous().authorization(), None);
    }

    #[test]
    fn token_response_defaults_type() {
        let response: TokenResponse =
            serde_json::from_value(serde_json::json!({"access_token": "abc"})).unwrap();
        assert_eq!(response.access_token.as_str(), "abc");
        assert_eq!(response.token_type, "bearer");
    }
}
