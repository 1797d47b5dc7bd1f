//! Infrastructure layer for the chat server.
//!
//! Contains the OS-facing adapters: the TCP accept loop, per-connection
//! sessions, and the TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `chat_core`, but MUST NOT be imported by the `application` or `domain`
//! layers.

pub mod server;
pub mod session;
pub mod storage;
