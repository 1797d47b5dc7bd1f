//! chat-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! The client:
//!
//! 1. Connects to the server and sends the display name as the first frame.
//! 2. Prints every frame the server sends, as-is.
//! 3. Sends each console line as one frame, after checking its length.
//! 4. On `exit` / `close`, waits for `Goodbye!` and the server's close.

/// Application layer: console input rules.
pub mod application;

/// Infrastructure layer: the TCP connection.
pub mod infrastructure;

pub use application::compose::{compose, validate_name, Outbound};
pub use infrastructure::network::{ChatConnection, ClientError, ClientEvent};
