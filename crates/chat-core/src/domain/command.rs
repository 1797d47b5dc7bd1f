//! The in-band command grammar.
//!
//! Any chat line starting with `/` is a command.  The line is split on
//! whitespace and the first token, compared case-insensitively, selects the
//! command:
//!
//! | command    | aliases  | arguments                  |
//! |------------|----------|----------------------------|
//! | `/whisper` | `/w`     | `<username> <message...>`  |
//! | `/who`     | `/users` | none                       |
//! | `/help`    | `/h`     | none                       |
//!
//! Parsing is pure; executing a command against the live registry happens in
//! the server's application layer.

use thiserror::Error;

/// Usage line for `/whisper`, shown when arguments are missing.
pub const WHISPER_USAGE: &str = "/whisper <username> <message>";

/// Static text returned by `/help`.
pub const HELP_TEXT: &str = "Available commands:\n  \
/whisper <username> <message>  (alias /w)      Send a private message\n  \
/who                           (alias /users)  List connected users\n  \
/help                          (alias /h)      Show this help\n  \
exit | close                                   Leave the chat";

/// A parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Private message to one user.
    Whisper { target: String, message: String },
    /// List connected users.
    Who,
    /// Show the command summary.
    Help,
    /// Any other `/…` token, kept verbatim for the error reply.
    Unknown(String),
}

/// A command line that names a known command but is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: {usage}")]
    MissingArguments { usage: &'static str },
}

/// Returns `true` if `text` should be handled as a command.
pub fn is_command(text: &str) -> bool {
    text.starts_with('/')
}

/// Parses a `/`-prefixed line into a [`Command`].
///
/// The whisper message is the remaining tokens re-joined with single spaces.
/// Extra arguments to `/who` and `/help` are ignored.
///
/// # Errors
///
/// Returns [`CommandError::MissingArguments`] when `/whisper` lacks a target
/// or a message.
///
/// # Examples
///
/// ```rust
/// use chat_core::domain::command::{parse_command, Command};
///
/// assert_eq!(
///     parse_command("/w bob see you").unwrap(),
///     Command::Whisper { target: "bob".into(), message: "see you".into() }
/// );
/// assert_eq!(parse_command("/USERS").unwrap(), Command::Who);
/// assert!(parse_command("/whisper bob").is_err());
/// ```
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(Command::Unknown(line.to_string()));
    };

    match head.to_lowercase().as_str() {
        "/whisper" | "/w" => {
            let target = tokens.next();
            let message = tokens.collect::<Vec<_>>().join(" ");
            match target {
                Some(target) if !message.is_empty() => Ok(Command::Whisper {
                    target: target.to_string(),
                    message,
                }),
                _ => Err(CommandError::MissingArguments {
                    usage: WHISPER_USAGE,
                }),
            }
        }
        "/who" | "/users" => Ok(Command::Who),
        "/help" | "/h" => Ok(Command::Help),
        _ => Ok(Command::Unknown(head.to_string())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
