//! Application layer for the chat server.
//!
//! These modules hold the chat semantics and depend only on the
//! [`Recipient`](registry::Recipient) trait, never on sockets, so every rule
//! here is unit-testable with in-memory recipients.
//!
//! # Sub-modules
//!
//! - **`registry`** – The shared directory of live sessions and their unique
//!   display names.
//!
//! - **`relay`** – Broadcast and private delivery with per-recipient failure
//!   isolation.
//!
//! - **`commands`** – Executes `/whisper`, `/who`, `/help` and reports
//!   unknown commands.

pub mod commands;
pub mod registry;
pub mod relay;

#[cfg(test)]
pub(crate) mod testing;
