//! Chat application module for conversing with Kris Bot.
//!
//! This module provides the chat panel and the pieces the interactive
//! `krisbot-chat` REPL is built from:
//!
//! - [`panel`]: the transcript and turn-taking state machine
//! - [`render`]: plain-text rendering of turns
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing

mod commands;
mod config;
pub mod panel;
pub mod render;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use panel::{ChatPanel, PendingSend, Reply};
pub use render::{PlainTextRenderer, Renderer, format_turn};
