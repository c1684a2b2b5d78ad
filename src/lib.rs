//! Client for the Kris Bot chat API.
//!
//! [`SessionManager`] keeps the bearer token and current user; [`ChatPanel`]
//! keeps the transcript.  Both talk to the server through [`KrisBot`].

// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod service;
pub mod session;
pub mod token_store;
pub mod types;
pub mod utils;

// Re-exports
pub use chat::ChatPanel;
pub use client::KrisBot;
pub use error::{Error, FailureKind, Result};
pub use observability::register_biometrics;
pub use service::{AuthService, ChatService};
pub use session::{SessionManager, SessionState};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::*;
