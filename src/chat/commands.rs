//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to manage their session and transcript without sending
//! messages to the bot.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Log in, optionally naming the email up front.
    Login(Option<String>),

    /// Create an account and log in.
    Register,

    /// Log out and discard the transcript.
    Logout,

    /// Show the logged-in user.
    WhoAmI,

    /// Clear the conversation history.
    Clear,

    /// List conversations stored on the server.
    History,

    /// Delete a stored conversation.
    DeleteConversation(String),

    /// Upload a local file.
    Upload(String),

    /// List uploaded files.
    Files,

    /// Delete an uploaded file.
    RemoveFile(String),

    /// Save the transcript to a file.
    SaveTranscript(String),

    /// Load a transcript from a file.
    LoadTranscript(String),

    /// Check that the server is up.
    Health,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use krisbot::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/login a@b.com").is_some());
/// assert!(parse_command("Hello, Kris!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "login" => ChatCommand::Login(argument.map(|s| s.to_string())),
        "register" | "signup" => ChatCommand::Register,
        "logout" => ChatCommand::Logout,
        "whoami" | "me" => ChatCommand::WhoAmI,
        "clear" => ChatCommand::Clear,
        "history" => ChatCommand::History,
        "delete" => match argument {
            Some(id) => ChatCommand::DeleteConversation(id.to_string()),
            None => ChatCommand::Invalid("/delete requires a conversation id".to_string()),
        },
        "upload" => match argument {
            Some(path) => ChatCommand::Upload(path.to_string()),
            None => ChatCommand::Invalid("/upload requires a file path".to_string()),
        },
        "files" => ChatCommand::Files,
        "rmfile" => match argument {
            Some(name) => ChatCommand::RemoveFile(name.to_string()),
            None => ChatCommand::Invalid("/rmfile requires a file name".to_string()),
        },
        "save" => match argument {
            Some(arg) => ChatCommand::SaveTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "load" => match argument {
            Some(arg) => ChatCommand::LoadTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/load requires a file path".to_string()),
        },
        "health" => ChatCommand::Health,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /login [email]         Log in (prompts for anything not given)
  /register              Create an account and log in
  /logout                Log out and clear the conversation
  /whoami                Show the logged-in user
  /clear                 Clear conversation history
  /history               List conversations stored on the server
  /delete <id>           Delete a stored conversation
  /upload <file>         Upload a file (10 MB max)
  /files                 List uploaded files
  /rmfile <name>         Delete an uploaded file
  /save <file>           Save the current transcript
  /load <file>           Load a transcript from disk
  /health                Check that the server is up
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_login() {
        assert_eq!(parse_command("/login"), Some(ChatCommand::Login(None)));
        assert_eq!(
            parse_command("/login   a@b.com  "),
            Some(ChatCommand::Login(Some("a@b.com".to_string())))
        );
    }

    #[test]
    fn parse_session_commands() {
        assert_eq!(parse_command("/register"), Some(ChatCommand::Register));
        assert_eq!(parse_command("/signup"), Some(ChatCommand::Register));
        assert_eq!(parse_command("/logout"), Some(ChatCommand::Logout));
        assert_eq!(parse_command("/whoami"), Some(ChatCommand::WhoAmI));
    }

    #[test]
    fn parse_history_commands() {
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(
            parse_command("/delete conv_1_2"),
            Some(ChatCommand::DeleteConversation("conv_1_2".to_string()))
        );
        assert!(matches!(
            parse_command("/delete"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_file_commands() {
        assert_eq!(
            parse_command("/upload ./notes.txt"),
            Some(ChatCommand::Upload("./notes.txt".to_string()))
        );
        assert_eq!(parse_command("/files"), Some(ChatCommand::Files));
        assert_eq!(
            parse_command("/rmfile notes.txt"),
            Some(ChatCommand::RemoveFile("notes.txt".to_string()))
        );
        assert!(matches!(
            parse_command("/upload"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
        assert!(matches!(
            parse_command("/rmfile   "),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_transcript_commands() {
        assert_eq!(
            parse_command("/save session.json"),
            Some(ChatCommand::SaveTranscript("session.json".to_string()))
        );
        assert_eq!(
            parse_command("/load session.json"),
            Some(ChatCommand::LoadTranscript("session.json".to_string()))
        );
        assert!(matches!(
            parse_command("/save"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/dance"),
            Some(ChatCommand::Invalid("Unknown command: /dance".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello, Kris!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/login"));
        assert!(help.contains("/logout"));
        assert!(help.contains("/clear"));
    }
}
