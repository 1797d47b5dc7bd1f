//! Command interpreter: executes parsed `/commands` against the live registry.
//!
//! Parsing lives in `chat_core::domain::command` and is pure.  This module
//! adds the side effects: looking up whisper targets, delivering private
//! messages through the [`Relay`], and building the reply for the invoking
//! session.  Every command produces exactly one reply, and it goes only to
//! the invoker.

use chat_core::domain::command::HELP_TEXT;
use chat_core::{parse_command, Command, ServerMessage, SessionId};
use tracing::debug;

use super::relay::Relay;

/// The session that issued a command.
#[derive(Debug, Clone, Copy)]
pub struct Invoker<'a> {
    pub id: SessionId,
    pub name: &'a str,
}

/// Parses `line` and executes it, returning the reply for the invoker.
///
/// Malformed invocations become an `ERROR: Usage: …` reply.
pub async fn handle_command_line(
    line: &str,
    invoker: Invoker<'_>,
    relay: &Relay,
) -> ServerMessage {
    match parse_command(line) {
        Ok(command) => execute(command, invoker, relay).await,
        Err(e) => ServerMessage::error(e.to_string()),
    }
}

/// Executes one parsed command.
pub async fn execute(command: Command, invoker: Invoker<'_>, relay: &Relay) -> ServerMessage {
    match command {
        Command::Whisper { target, message } => whisper(&target, message, invoker, relay).await,
        Command::Who => who(relay).await,
        Command::Help => ServerMessage::CommandReply(HELP_TEXT.to_string()),
        Command::Unknown(token) => ServerMessage::error(format!(
            "Unknown command '{token}'. Type /help for available commands."
        )),
    }
}

async fn whisper(
    target: &str,
    message: String,
    invoker: Invoker<'_>,
    relay: &Relay,
) -> ServerMessage {
    let Some(entry) = relay.registry().find_by_name(target).await else {
        return ServerMessage::error(format!("User '{target}' not found"));
    };
    if entry.id == invoker.id {
        return ServerMessage::error("You cannot whisper to yourself");
    }

    let delivery = ServerMessage::PrivateFrom {
        from: invoker.name.to_string(),
        text: message.clone(),
    };
    if relay.send_private(&entry, &delivery).await {
        debug!("'{}' whispered to '{}'", invoker.name, entry.name);
        ServerMessage::PrivateTo {
            to: entry.name,
            text: message,
        }
    } else {
        ServerMessage::error(format!("Could not deliver message to '{}'", entry.name))
    }
}

async fn who(relay: &Relay) -> ServerMessage {
    let mut names = relay.registry().list_names().await;
    names.sort_by_key(|n| n.to_lowercase());

    let mut reply = format!("Users online ({}):", names.len());
    for name in &names {
        reply.push_str("\n  ");
        reply.push_str(name);
    }
    ServerMessage::CommandReply(reply)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
