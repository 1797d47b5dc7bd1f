//! User-facing input rules: session identity, display names, and chat text.
//!
//! These checks sit above the framing layer.  A frame may carry up to
//! 10 000 bytes, but a display name is capped at [`MAX_USERNAME_CHARS`] and a
//! chat line at [`MAX_MESSAGE_CHARS`].  Limits are counted in characters, not
//! bytes.

use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for one connected session, derived from UUID v4.
pub type SessionId = Uuid;

/// Longest accepted display name, in characters, after trimming.
pub const MAX_USERNAME_CHARS: usize = 50;

/// Longest accepted chat line or command, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Why a proposed display name was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username is empty")]
    Empty,
    #[error("username is {length} characters (max {MAX_USERNAME_CHARS})")]
    TooLong { length: usize },
}

/// Trims a proposed display name and checks its length.
///
/// # Errors
///
/// Returns [`UsernameError::Empty`] if nothing is left after trimming, or
/// [`UsernameError::TooLong`] if the trimmed name exceeds
/// [`MAX_USERNAME_CHARS`].
///
/// # Examples
///
/// ```rust
/// use chat_core::domain::user::normalize_username;
///
/// assert_eq!(normalize_username("  alice \n").unwrap(), "alice");
/// assert!(normalize_username("   ").is_err());
/// ```
pub fn normalize_username(raw: &str) -> Result<String, UsernameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UsernameError::Empty);
    }
    let length = trimmed.chars().count();
    if length > MAX_USERNAME_CHARS {
        return Err(UsernameError::TooLong { length });
    }
    Ok(trimmed.to_string())
}

/// Returns `true` if `text` is longer than [`MAX_MESSAGE_CHARS`] characters.
pub fn exceeds_message_limit(text: &str) -> bool {
    // Skip the count for anything that cannot possibly be over the limit.
    text.len() > MAX_MESSAGE_CHARS && text.chars().count() > MAX_MESSAGE_CHARS
}

/// Returns `true` for the in-band exit words `close` and `exit`
/// (case-insensitive, surrounding whitespace ignored).
pub fn is_exit_request(text: &str) -> bool {
    let word = text.trim();
    word.eq_ignore_ascii_case("close") || word.eq_ignore_ascii_case("exit")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
