//! Chat server: listener, accept loop, and graceful shutdown.
//!
//! # How the accept loop stops
//!
//! `accept()` is wrapped in a short timeout (`accept_poll_interval`, 200 ms
//! by default) so the loop re-checks the shared `running` flag even when no
//! one is connecting.  Ctrl-C in `main.rs` clears the flag; within one poll
//! interval the loop exits and [`ChatServer::shutdown`] runs.
//!
//! # Shutdown
//!
//! The registry is drained under its lock, then every drained session is
//! sent the shutdown notice and closed with the lock released, the same
//! isolation pattern a broadcast uses.  Sessions that were still
//! handshaking find the flag cleared and leave on their own.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_core::ServerMessage;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::application::registry::Registry;
use crate::application::relay::Relay;
use crate::domain::ServerConfig;
use crate::infrastructure::session::{handle_connection, SessionContext};

/// Error type for server lifecycle operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// The running server: configuration, shared registry, and running flag.
pub struct ChatServer {
    config: Arc<ServerConfig>,
    relay: Relay,
    running: Arc<AtomicBool>,
}

impl ChatServer {
    pub fn new(config: ServerConfig, running: Arc<AtomicBool>) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            relay: Relay::new(Arc::new(Registry::new())),
            running,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.relay.registry()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Binds the TCP listener on the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is in use or not
    /// permitted.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.bind_addr;
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Accepts connections until the running flag is cleared, then shuts
    /// down every session.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        match listener.local_addr() {
            Ok(addr) => info!("chat server listening on {addr}"),
            Err(e) => debug!("local_addr unavailable: {e}"),
        }

        let ctx = SessionContext {
            relay: self.relay.clone(),
            config: Arc::clone(&self.config),
            running: Arc::clone(&self.running),
        };

        loop {
            if !self.is_running() {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            match timeout(self.config.accept_poll_interval, listener.accept()).await {
                Ok(Ok((stream, peer))) => {
                    info!("new connection from {peer}");
                    let ctx = ctx.clone();
                    tokio::spawn(handle_connection(stream, peer, ctx));
                }
                Ok(Err(e)) => {
                    if self.is_running() {
                        error!("accept error: {e}");
                    } else {
                        debug!("accept error during shutdown: {e}");
                    }
                }
                Err(_) => {
                    // Poll interval elapsed with no connection.
                }
            }
        }

        drop(listener);
        self.shutdown().await;
    }

    /// Clears the running flag, notifies every session, and closes them.
    ///
    /// Safe to call more than once and concurrently with client churn.
    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);

        let sessions = self.registry().drain().await;
        info!("shutting down; closing {} session(s)", sessions.len());

        let notice = ServerMessage::shutdown();
        for entry in sessions {
            if !entry.recipient.deliver(&notice).await {
                debug!("shutdown notice to '{}' failed", entry.name);
            }
            entry.recipient.close().await;
        }
    }
}

/// Binds and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let server = ChatServer::new(config, running);
    let listener = server.bind().await?;
    server.serve(listener).await;
    info!("chat server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
