//! Client-side input rules.
//!
//! The server enforces the same limits, but checking here gives the user an
//! immediate answer without a round trip.

use chat_core::domain::user::{exceeds_message_limit, is_exit_request, normalize_username};
use chat_core::MAX_MESSAGE_CHARS;

use crate::infrastructure::network::ClientError;

/// What to do with one line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send the text and keep going.
    Send(String),
    /// Send the exit word, then wait for `Goodbye!` and the close.
    Leave(String),
    /// Nothing to send.
    Skip,
}

/// Classifies a console line.  The trailing line ending is removed.
///
/// # Errors
///
/// Returns [`ClientError::MessageTooLong`] when the line is over
/// [`MAX_MESSAGE_CHARS`] characters.
pub fn compose(line: &str) -> Result<Outbound, ClientError> {
    let text = line.trim_end_matches(['\r', '\n']);
    if text.trim().is_empty() {
        return Ok(Outbound::Skip);
    }
    if exceeds_message_limit(text) {
        return Err(ClientError::MessageTooLong {
            length: text.chars().count(),
            max: MAX_MESSAGE_CHARS,
        });
    }
    if is_exit_request(text) {
        return Ok(Outbound::Leave(text.trim().to_string()));
    }
    Ok(Outbound::Send(text.to_string()))
}

/// Validates a display name before it is sent in the handshake.
///
/// # Errors
///
/// Returns [`ClientError::InvalidName`] for empty or over-long names.
pub fn validate_name(raw: &str) -> Result<String, ClientError> {
    Ok(normalize_username(raw)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
