// Public modules
pub mod chat;
pub mod conversation;
pub mod files;
pub mod registration;
pub mod token;
pub mod turn;
pub mod user;

// Re-exports
pub use chat::{ChatMessage, ChatRequest, ChatResponse};
pub use conversation::{
    Acknowledgement, Conversation, ConversationList, HealthStatus, StoredMessage,
};
pub use files::{FileList, MAX_UPLOAD_BYTES, StoredFile, UploadedFile};
pub(crate) use registration::LoginForm;
pub use registration::Registration;
pub use token::{BearerToken, RequestContext, TokenResponse};
pub use turn::{ChatRole, FALLBACK_REPLY, Turn};
pub use user::User;
