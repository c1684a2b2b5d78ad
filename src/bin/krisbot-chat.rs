//! Interactive terminal chat with Kris Bot.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a server on localhost:8000
//! krisbot-chat
//!
//! # Somewhere else
//! krisbot-chat --base-url http://bot.example.com/
//!
//! # Disable colors (useful for piping output)
//! krisbot-chat --no-color
//! ```
//!
//! The stored session in `~/.krisbot/token` is restored on start.  Use
//! `/login` or `/register` otherwise, and `/help` for the remaining commands.

use std::sync::Arc;

use arrrg::CommandLine;
use dialoguer::Password;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use krisbot::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatPanel, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use krisbot::{FileTokenStore, KrisBot, SessionManager, SessionState};

type Session = SessionManager<KrisBot, FileTokenStore>;

/// Main entry point for the krisbot-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("krisbot-chat [OPTIONS]");
    let config = ChatConfig::from(args);

    let client = KrisBot::with_options(Some(config.base_url.clone()), Some(config.timeout))?;
    let mut session = SessionManager::new(client.clone(), FileTokenStore::new(&config.data_dir));
    let mut panel = ChatPanel::new();
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    // Wakes the in-flight request on Ctrl+C.
    let interrupts = Arc::new(Notify::new());
    let interrupts_clone = interrupts.clone();
    ctrlc::set_handler(move || {
        interrupts_clone.notify_waiters();
    })?;

    println!("Kris Bot ({})", client.base_url());
    match session.bootstrap().await {
        SessionState::Authenticated => {
            renderer.print_header(&panel.header(&session));
            renderer.print_welcome();
        }
        _ => renderer.print_info("Not logged in. Use /login or /register."),
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Login(email) => {
                            login(&mut rl, &mut session, &panel, &mut renderer, email).await;
                        }
                        ChatCommand::Register => {
                            register(&mut rl, &mut session, &panel, &mut renderer).await;
                        }
                        ChatCommand::Logout => {
                            panel.logout(&mut session);
                            renderer.print_info("Logged out.");
                        }
                        ChatCommand::WhoAmI => match session.user() {
                            Some(user) => renderer.print_info(&format!(
                                "{} <{}>{}",
                                user.username,
                                user.email,
                                if user.is_verified { "" } else { " (unverified)" }
                            )),
                            None => renderer.print_info("Not logged in."),
                        },
                        ChatCommand::Clear => {
                            panel.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::History => match client.chat_history(&session.context()).await {
                            Ok(conversations) if conversations.is_empty() => {
                                renderer.print_info("No stored conversations.")
                            }
                            Ok(conversations) => {
                                for conversation in conversations {
                                    renderer.print_info(&format!(
                                        "    {} {} ({} messages)",
                                        conversation.id,
                                        conversation.title.as_deref().unwrap_or("(untitled)"),
                                        conversation.messages.len()
                                    ));
                                }
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::DeleteConversation(id) => {
                            match client.delete_conversation(&session.context(), &id).await {
                                Ok(message) => renderer.print_info(&message),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Upload(path) => {
                            match client.upload_path(&session.context(), &path).await {
                                Ok(uploaded) => renderer.print_info(&format!(
                                    "Uploaded {} ({} bytes)",
                                    uploaded.filename,
                                    uploaded.size.unwrap_or_default()
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Files => match client.list_files(&session.context()).await {
                            Ok(files) if files.is_empty() => {
                                renderer.print_info("No uploaded files.")
                            }
                            Ok(files) => {
                                for file in files {
                                    renderer.print_info(&format!(
                                        "    {} ({} bytes)",
                                        file.filename, file.size
                                    ));
                                }
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::RemoveFile(name) => {
                            match client.delete_file(&session.context(), &name).await {
                                Ok(message) => renderer.print_info(&message),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::SaveTranscript(path) => match panel.save_transcript_to(&path) {
                            Ok(_) => renderer.print_info(&format!("Transcript saved to {}", path)),
                            Err(err) => {
                                renderer.print_error(&format!("Failed to save transcript: {}", err))
                            }
                        },
                        ChatCommand::LoadTranscript(path) => {
                            match panel.load_transcript_from(&path) {
                                Ok(_) => {
                                    renderer.print_info(&format!("Transcript loaded from {}", path));
                                    for turn in panel.transcript() {
                                        renderer.render_turn(turn);
                                    }
                                }
                                Err(err) => renderer
                                    .print_error(&format!("Failed to load transcript: {}", err)),
                            }
                        }
                        ChatCommand::Health => match client.health().await {
                            Ok(status) => renderer.print_info(&format!(
                                "{}: {}",
                                status.status, status.message
                            )),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                if !session.is_authenticated() {
                    renderer.print_error("Log in with /login or /register first.");
                    continue;
                }

                // Regular message - send to the bot
                let Some(pending) = panel.begin_submit(line, session.context()) else {
                    continue;
                };
                if let Some(turn) = panel.latest() {
                    renderer.render_turn(turn);
                }
                renderer.print_pending();

                let cancel = pending.cancellation_token();
                let dispatch = pending.dispatch(&client);
                tokio::pin!(dispatch);
                let reply = loop {
                    tokio::select! {
                        reply = &mut dispatch => break reply,
                        _ = interrupts.notified() => {
                            renderer.print_interrupted();
                            cancel.cancel();
                        }
                    }
                };
                if let Some(turn) = panel.complete(reply) {
                    renderer.render_turn(turn);
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn login(
    rl: &mut DefaultEditor,
    session: &mut Session,
    panel: &ChatPanel,
    renderer: &mut PlainTextRenderer,
    email: Option<String>,
) {
    let Some(email) = email.or_else(|| prompt(rl, "Email: ")) else {
        return;
    };
    let Some(password) = prompt_password() else {
        return;
    };
    match session.login(&email, &password).await {
        Ok(_) => {
            renderer.print_header(&panel.header(&*session));
            renderer.print_welcome();
        }
        Err(err) => renderer.print_error(&format!("{} ({})", err, err.kind())),
    }
}

async fn register(
    rl: &mut DefaultEditor,
    session: &mut Session,
    panel: &ChatPanel,
    renderer: &mut PlainTextRenderer,
) {
    let Some(email) = prompt(rl, "Email: ") else {
        return;
    };
    let Some(username) = prompt(rl, "Username: ") else {
        return;
    };
    let Some(password) = prompt_password() else {
        return;
    };
    match session.register(&email, &username, &password).await {
        Ok(_) => {
            renderer.print_header(&panel.header(&*session));
            renderer.print_welcome();
        }
        Err(err) => renderer.print_error(&format!("{} ({})", err, err.kind())),
    }
}

fn prompt(rl: &mut DefaultEditor, label: &str) -> Option<String> {
    match rl.readline(label) {
        Ok(line) if !line.trim().is_empty() => Some(line.trim().to_string()),
        _ => None,
    }
}

fn prompt_password() -> Option<String> {
    Password::new().with_prompt("Password").interact().ok()
}
