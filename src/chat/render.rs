//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction so the panel's
//! transcript can be shown in different styles.  The default implementation
//! writes plain text with optional ANSI styling.

use std::io::{self, Stdout, Write};

use time::format_description::FormatItem;
use time::macros::format_description;

use crate::types::{ChatRole, Turn};

/// ANSI escape code for dim text (used for timestamps).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for the header).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for user turns).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for assistant turns).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors and fallback turns).
const ANSI_RED: &str = "\x1b[31m";

const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Show the header line, e.g. "Welcome, kris".
    fn print_header(&mut self, header: &str);

    /// Show the empty-transcript greeting.
    fn print_welcome(&mut self);

    /// Show one turn.  Called after every append so the newest turn is last on screen.
    fn render_turn(&mut self, turn: &Turn);

    /// Show that a reply is on its way.
    fn print_pending(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the user interrupts an in-flight reply.
    fn print_interrupted(&mut self);
}

/// Format a turn as `[hh:mm:ss] Role: content`.
pub fn format_turn(turn: &Turn) -> String {
    let time = turn
        .created_at
        .format(TIME_FORMAT)
        .unwrap_or_else(|_| "--:--:--".to_string());
    let label = match turn.role {
        ChatRole::User => "You",
        ChatRole::Assistant => "Kris Bot",
    };
    format!("[{time}] {label}: {}", turn.content)
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            out: io::stdout(),
            use_color,
        }
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Consumes the renderer, returning its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, style: Option<&str>, text: &str) {
        let _ = match style {
            Some(style) if self.use_color => writeln!(self.out, "{style}{text}{ANSI_RESET}"),
            _ => writeln!(self.out, "{text}"),
        };
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_header(&mut self, header: &str) {
        self.line(Some(ANSI_BOLD), &format!("Kris Bot | {header}"));
    }

    fn print_welcome(&mut self) {
        self.line(Some(ANSI_DIM), "Welcome to Kris Bot!");
        self.line(
            Some(ANSI_DIM),
            "Start a conversation by typing a message below.",
        );
    }

    fn render_turn(&mut self, turn: &Turn) {
        let style = match (turn.role, turn.fallback) {
            (_, true) => ANSI_RED,
            (ChatRole::User, false) => ANSI_CYAN,
            (ChatRole::Assistant, false) => ANSI_GREEN,
        };
        let text = format_turn(turn);
        self.line(Some(style), &text);
    }

    fn print_pending(&mut self) {
        self.line(Some(ANSI_DIM), "Kris Bot is typing...");
    }

    fn print_error(&mut self, error: &str) {
        self.line(Some(ANSI_RED), &format!("Error: {error}"));
    }

    fn print_info(&mut self, info: &str) {
        self.line(None, info);
    }

    fn print_interrupted(&mut self) {
        self.line(Some(ANSI_DIM), "[interrupted]");
    }
}
