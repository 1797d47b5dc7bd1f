//! Domain rules for the chat relay.
//!
//! Pure logic with no I/O: what counts as a valid display name or chat line,
//! and how an in-band `/command` line is parsed.  Code in the server and the
//! client depends on these rules; nothing here depends on them.

pub mod command;
pub mod user;

pub use command::{parse_command, Command, CommandError};
pub use user::{normalize_username, SessionId, UsernameError};
