//! # chat-core
//!
//! Shared library for the chat relay containing the wire codec, the outbound
//! message types, and the in-band command grammar.
//!
//! This crate is used by both the server and the client.  It opens no
//! sockets: the stream transport is generic over tokio's `AsyncRead` and
//! `AsyncWrite`.
//!
//! # Architecture overview
//!
//! - **`protocol`** – How text travels over the network.  Every message is a
//!   frame: a 4-byte big-endian length followed by UTF-8 text (at most
//!   10 000 bytes).  Outbound server messages are a typed enum rendered to
//!   their textual tags only when written.
//!
//! - **`domain`** – Input rules (display names, message length, exit words)
//!   and the `/command` parser.

pub mod domain;
pub mod protocol;

pub use domain::command::{parse_command, Command, CommandError};
pub use domain::user::{SessionId, MAX_MESSAGE_CHARS, MAX_USERNAME_CHARS};
pub use protocol::codec::{decode_frame, encode_frame, FrameError, MAX_FRAME_LEN};
pub use protocol::messages::ServerMessage;
pub use protocol::transport::{read_frame, write_frame};
