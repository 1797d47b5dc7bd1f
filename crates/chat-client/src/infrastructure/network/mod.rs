//! Network infrastructure for the client application.
//!
//! Architecture:
//! - `ChatConnection` owns the write half of the TCP stream behind a mutex.
//! - A reader task decodes inbound frames and forwards them as
//!   [`ClientEvent`]s on an `mpsc` channel, ending with
//!   [`ClientEvent::Closed`] once the server hangs up.
//! - Outbound lines are framed and written through [`ChatConnection::send`].

use std::net::SocketAddr;

use chat_core::domain::user::UsernameError;
use chat_core::{read_frame, write_frame};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connection to the server failed.
    #[error("failed to connect to server at {addr}: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The display name was refused before sending.
    #[error("invalid name: {0}")]
    InvalidName(#[from] UsernameError),
    /// A chat line was refused before sending.
    #[error("message too long ({length} characters, max {max})")]
    MessageTooLong { length: usize, max: usize },
    /// The connection has already been closed.
    #[error("not connected")]
    NotConnected,
}

/// Events delivered from the reader task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// One frame of text from the server.
    Frame(String),
    /// The server closed the connection (or it failed).
    Closed,
}

/// An established connection to the chat server.
pub struct ChatConnection {
    write_half: Mutex<Option<OwnedWriteHalf>>,
}

impl ChatConnection {
    /// Connects, sends `name` as the handshake frame, and starts the reader
    /// task.
    ///
    /// The server's welcome (or rejection) arrives as the first
    /// [`ClientEvent::Frame`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectFailed`] if the TCP connection cannot be
    /// established, or [`ClientError::Io`] if the handshake frame cannot be
    /// written.
    pub async fn connect(
        server_addr: SocketAddr,
        name: &str,
    ) -> Result<(Self, mpsc::Receiver<ClientEvent>), ClientError> {
        let stream = TcpStream::connect(server_addr)
            .await
            .map_err(|source| ClientError::ConnectFailed {
                addr: server_addr,
                source,
            })?;
        stream.set_nodelay(true)?;
        info!("connected to chat server at {server_addr}");

        let (read_half, mut write_half) = stream.into_split();
        write_frame(&mut write_half, name).await?;

        let (tx, rx) = mpsc::channel(128);
        tokio::spawn(read_loop(read_half, tx));

        let connection = Self {
            write_half: Mutex::new(Some(write_half)),
        };
        Ok((connection, rx))
    }

    /// Frames and sends one line of text.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] after [`close`](Self::close), or
    /// [`ClientError::Io`] if the write fails.
    pub async fn send(&self, text: &str) -> Result<(), ClientError> {
        let mut guard = self.write_half.lock().await;
        let writer = guard.as_mut().ok_or(ClientError::NotConnected)?;
        write_frame(writer, text).await?;
        Ok(())
    }

    /// Shuts down the write side.  Idempotent.
    pub async fn close(&self) {
        if let Some(mut writer) = self.write_half.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("shutdown of write half failed: {e}");
            }
        }
    }
}

/// Reads frames until the stream ends, forwarding each one on `tx`.
async fn read_loop<R>(mut reader: R, tx: mpsc::Sender<ClientEvent>)
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_frame(&mut reader).await {
            Ok(text) => {
                if tx.send(ClientEvent::Frame(text)).await.is_err() {
                    return;
                }
            }
            Err(e) if e.is_end_of_stream() => {
                debug!("server closed the connection");
                break;
            }
            Err(e) => {
                warn!("read error on connection: {e}");
                break;
            }
        }
    }
    let _ = tx.send(ClientEvent::Closed).await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
