//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the binary runs with.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::DEFAULT_BASE_URL;
use crate::token_store::resolve_data_dir;

/// Default per-request timeout, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for the krisbot-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the Kris Bot API.
    #[arrrg(optional, "API base URL (default: $KRISBOT_BASE_URL or http://localhost:8000/)", "URL")]
    pub base_url: Option<String>,

    /// Directory holding the stored token.
    #[arrrg(optional, "State directory (default: $KRISBOT_DATA_DIR or ~/.krisbot)", "DIR")]
    pub data_dir: Option<String>,

    /// Per-request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the API.
    pub base_url: String,

    /// Directory holding the stored token.
    pub data_dir: PathBuf,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: `KRISBOT_BASE_URL`, else http://localhost:8000/
    /// - Data dir: see [`resolve_data_dir`]
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: std::env::var("KRISBOT_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            data_dir: resolve_data_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_color: true,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let mut config = ChatConfig::new();
        if let Some(base_url) = args.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(data_dir) = args.data_dir {
            config = config.with_data_dir(data_dir);
        }
        if let Some(timeout) = args.timeout {
            config = config.with_timeout(Duration::from_secs(timeout));
        }
        if args.no_color {
            config = config.without_color();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.use_color);
        assert!(!config.base_url.is_empty());
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            base_url: Some("http://bot.internal:9000/".to_string()),
            data_dir: Some("/tmp/krisbot".to_string()),
            timeout: Some(5),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.base_url, "http://bot.internal:9000/");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/krisbot"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("http://example.com/")
            .with_data_dir("state")
            .with_timeout(Duration::from_secs(1))
            .without_color();

        assert_eq!(config.base_url, "http://example.com/");
        assert_eq!(config.data_dir, PathBuf::from("state"));
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert!(!config.use_color);
    }
}
