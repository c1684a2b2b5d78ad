//! The remote operations the session and the chat panel depend on.
//!
//! [`KrisBot`] implements both traits over HTTP.  Tests substitute their own.

use crate::KrisBot;
use crate::error::Result;
use crate::types::{BearerToken, ChatRequest, ChatResponse, Registration, RequestContext, User};

/// Account operations.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn issue_token(&self, email: &str, password: &str) -> Result<BearerToken>;

    /// Fetch the profile `context` is authenticated as.
    async fn current_user(&self, context: &RequestContext) -> Result<User>;

    /// Create an account.
    async fn register(&self, registration: &Registration) -> Result<()>;
}

/// The chat endpoint.
#[async_trait::async_trait]
pub trait ChatService: Send + Sync {
    /// Send one message with its prior history and return the reply.
    async fn send_chat(&self, context: &RequestContext, request: &ChatRequest)
    -> Result<ChatResponse>;
}

#[async_trait::async_trait]
impl AuthService for KrisBot {
    async fn issue_token(&self, email: &str, password: &str) -> Result<BearerToken> {
        KrisBot::issue_token(self, email, password).await
    }

    async fn current_user(&self, context: &RequestContext) -> Result<User> {
        KrisBot::current_user(self, context).await
    }

    async fn register(&self, registration: &Registration) -> Result<()> {
        KrisBot::register(self, registration).await
    }
}

#[async_trait::async_trait]
impl ChatService for KrisBot {
    async fn send_chat(
        &self,
        context: &RequestContext,
        request: &ChatRequest,
    ) -> Result<ChatResponse> {
        KrisBot::send_chat(self, context, request).await
    }
}
