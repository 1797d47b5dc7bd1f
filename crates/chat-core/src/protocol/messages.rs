//! Outbound server message types.
//!
//! Inside the server every message is a typed [`ServerMessage`] variant.  The
//! textual tags clients see (`ERROR:`, `SERVER:`, `[PRIVATE from …]`, …) are
//! produced only by the [`Display`](std::fmt::Display) impl, at the wire
//! boundary, so dispatch never depends on string prefixes.

use std::fmt;

/// Reply sent when the handshake name is empty or too long.
pub const INVALID_USERNAME: &str = "Invalid username";

/// Farewell sent in response to `close` / `exit`.
pub const GOODBYE: &str = "Goodbye!";

/// Notice sent to every session when the server stops.
pub const SHUTDOWN_NOTICE: &str = "Server is shutting down. Goodbye!";

/// Every message the server can send to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Handshake accepted; carries the resolved name and current user count.
    Welcome { name: String, user_count: usize },
    /// Broadcast chat line from another user.
    Chat { from: String, text: String },
    /// Private message delivered to its target.
    PrivateFrom { from: String, text: String },
    /// Confirmation echoed to the sender of a private message.
    PrivateTo { to: String, text: String },
    /// A user completed the handshake.
    Joined { name: String },
    /// A user's session ended.
    Left { name: String },
    /// Informational notice from the server (`SERVER: …`).
    Notice(String),
    /// Multi-line reply to a command (`/who`, `/help`).
    CommandReply(String),
    /// Validation or command failure (`ERROR: …`).
    Error(String),
    /// Reply to `close` / `exit`.
    Goodbye,
}

impl ServerMessage {
    /// Convenience constructor for error replies.
    pub fn error(text: impl Into<String>) -> Self {
        ServerMessage::Error(text.into())
    }

    /// Convenience constructor for server notices.
    pub fn notice(text: impl Into<String>) -> Self {
        ServerMessage::Notice(text.into())
    }

    /// The notice broadcast when the server shuts down.
    pub fn shutdown() -> Self {
        ServerMessage::Notice(SHUTDOWN_NOTICE.to_string())
    }

    /// Short variant name for log lines that must not include message text.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "Welcome",
            ServerMessage::Chat { .. } => "Chat",
            ServerMessage::PrivateFrom { .. } => "PrivateFrom",
            ServerMessage::PrivateTo { .. } => "PrivateTo",
            ServerMessage::Joined { .. } => "Joined",
            ServerMessage::Left { .. } => "Left",
            ServerMessage::Notice(_) => "Notice",
            ServerMessage::CommandReply(_) => "CommandReply",
            ServerMessage::Error(_) => "Error",
            ServerMessage::Goodbye => "Goodbye",
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome { name, user_count } => write!(
                f,
                "SERVER: Welcome, {name}! Users online: {user_count}. \
                 Type /help for available commands."
            ),
            ServerMessage::Chat { from, text } => write!(f, "[{from}]: {text}"),
            ServerMessage::PrivateFrom { from, text } => {
                write!(f, "[PRIVATE from {from}]: {text}")
            }
            ServerMessage::PrivateTo { to, text } => write!(f, "[PRIVATE to {to}]: {text}"),
            ServerMessage::Joined { name } => write!(f, "--- {name} has joined the chat ---"),
            ServerMessage::Left { name } => write!(f, "--- {name} has left the chat ---"),
            ServerMessage::Notice(text) => write!(f, "SERVER: {text}"),
            ServerMessage::CommandReply(text) => f.write_str(text),
            ServerMessage::Error(text) => write!(f, "ERROR: {text}"),
            ServerMessage::Goodbye => f.write_str(GOODBYE),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_renders_bracketed_sender() {
        let msg = ServerMessage::Chat {
            from: "A".into(),
            text: "hi".into(),
        };
        assert_eq!(msg.to_string(), "[A]: hi");
    }

    #[test]
    fn test_private_envelopes_render_direction() {
        let incoming = ServerMessage::PrivateFrom {
            from: "A".into(),
            text: "secret".into(),
        };
        let echo = ServerMessage::PrivateTo {
            to: "B".into(),
            text: "secret".into(),
        };
        assert_eq!(incoming.to_string(), "[PRIVATE from A]: secret");
        assert_eq!(echo.to_string(), "[PRIVATE to B]: secret");
    }

    #[test]
    fn test_join_and_leave_notices() {
        assert_eq!(
            ServerMessage::Joined { name: "bob".into() }.to_string(),
            "--- bob has joined the chat ---"
        );
        assert_eq!(
            ServerMessage::Left { name: "bob".into() }.to_string(),
            "--- bob has left the chat ---"
        );
    }

    #[test]
    fn test_error_and_notice_tags() {
        assert_eq!(
            ServerMessage::error(INVALID_USERNAME).to_string(),
            "ERROR: Invalid username"
        );
        assert_eq!(
            ServerMessage::shutdown().to_string(),
            "SERVER: Server is shutting down. Goodbye!"
        );
    }

    #[test]
    fn test_welcome_mentions_name_and_count() {
        let text = ServerMessage::Welcome {
            name: "alice_1".into(),
            user_count: 3,
        }
        .to_string();
        assert!(text.starts_with("SERVER: Welcome, alice_1!"));
        assert!(text.contains("Users online: 3"));
    }

    #[test]
    fn test_goodbye_is_bare() {
        assert_eq!(ServerMessage::Goodbye.to_string(), "Goodbye!");
    }

    #[test]
    fn test_command_reply_is_untagged() {
        let reply = ServerMessage::CommandReply("line one\nline two".into());
        assert_eq!(reply.to_string(), "line one\nline two");
    }

    #[test]
    fn test_kind_does_not_expose_text() {
        let msg = ServerMessage::PrivateFrom {
            from: "A".into(),
            text: "password123".into(),
        };
        assert_eq!(msg.kind(), "PrivateFrom");
    }
}
