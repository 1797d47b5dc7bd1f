//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for runtime settings.  It is
//! a plain struct: the infrastructure layer fills it from the TOML file and
//! the command line, and tests build it directly.

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen address: loopback, port 8000.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// All runtime configuration for the chat server.
///
/// Built once at startup and shared across session tasks inside an `Arc`.
///
/// # Example
///
/// ```rust
/// use chat_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address and port the TCP listener binds to.
    pub bind_addr: SocketAddr,

    /// How long a new connection may take to send its display name.
    ///
    /// Armed only for the handshake; an active session has no read timeout.
    pub handshake_timeout: Duration,

    /// Upper bound on a single frame write to one client.
    ///
    /// A peer that stops reading surfaces as a failed delivery after this
    /// long instead of stalling the sender's fan-out.
    pub write_timeout: Duration,

    /// How long one `accept()` waits before the loop re-checks the running
    /// flag.
    pub accept_poll_interval: Duration,
}

impl Default for ServerConfig {
    /// | Field                 | Default            |
    /// |-----------------------|--------------------|
    /// | bind_addr             | `127.0.0.1:8000`   |
    /// | handshake_timeout     | 30 seconds         |
    /// | write_timeout         | 5 seconds          |
    /// | accept_poll_interval  | 200 milliseconds   |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            handshake_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(5),
            accept_poll_interval: Duration::from_millis(200),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
