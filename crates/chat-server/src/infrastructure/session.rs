//! Per-connection session: handshake, receive loop, and cleanup.
//!
//! # Lifecycle
//!
//! ```text
//! Connecting ──► Handshaking ──► Active ──► Closing ──► Closed
//!                     │                        ▲
//!                     └────────────────────────┘
//!              (timeout, empty or invalid name)
//! ```
//!
//! Each accepted connection gets one Tokio task.  The session body runs in an
//! inner task so that a panic inside it is caught as a `JoinError` and the
//! cleanup step (unregister, leave notice, close) still runs.
//!
//! # Writes and cancellation
//!
//! The write half of the connection lives inside [`ClientHandle`] behind a
//! `tokio::sync::Mutex`.  The session's own replies and deliveries from other
//! sessions' broadcasts all go through [`ClientHandle::deliver`], so frames
//! never interleave.
//!
//! A split read half is not woken when another task shuts the write half
//! down, so [`ClientHandle::close`] also fires a `watch` signal that the
//! receive loop selects on.  Eviction and shutdown both end the loop this way.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chat_core::domain::command::is_command;
use chat_core::domain::user::{
    exceeds_message_limit, is_exit_request, normalize_username, UsernameError,
};
use chat_core::protocol::messages::INVALID_USERNAME;
use chat_core::{read_frame, write_frame, FrameError, ServerMessage, SessionId};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::commands::{handle_command_line, Invoker};
use crate::application::registry::Recipient;
use crate::application::relay::Relay;
use crate::domain::ServerConfig;

/// Error reply for chat lines over the character limit.
pub const MESSAGE_TOO_LONG: &str = "Message too long (max 1000 characters)";

/// Why a session ended.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("no name received within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("empty handshake frame")]
    EmptyHandshake,

    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("could not write reply to client")]
    ReplyFailed,

    #[error("server is shutting down")]
    ShuttingDown,

    #[error("connection closed by server")]
    ClosedByServer,
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Handshaking,
    Active,
    Closing,
    Closed,
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type WriterGuard<'a> = MutexGuard<'a, Option<BoxedWriter>>;

// ── ClientHandle ──────────────────────────────────────────────────────────────

/// The shared, writable side of one session.
///
/// Registered in the [`Registry`](crate::application::registry::Registry) as
/// an `Arc<dyn Recipient>`; the session task keeps its own `Arc` and the read
/// half of the connection.
pub struct ClientHandle {
    id: SessionId,
    peer: SocketAddr,
    name: OnceLock<String>,
    state: StdMutex<SessionState>,
    writer: Mutex<Option<BoxedWriter>>,
    write_timeout: Duration,
    close_tx: watch::Sender<bool>,
    cleaned_up: AtomicBool,
}

impl ClientHandle {
    pub fn new<W>(peer: SocketAddr, writer: W, write_timeout: Duration) -> Arc<Self>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (close_tx, _) = watch::channel(false);
        Arc::new(Self {
            id: Uuid::new_v4(),
            peer,
            name: OnceLock::new(),
            state: StdMutex::new(SessionState::Connecting),
            writer: Mutex::new(Some(Box::new(writer))),
            write_timeout,
            close_tx,
            cleaned_up: AtomicBool::new(false),
        })
    }

    /// Resolved display name, once the handshake registered one.
    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().map(|s| *s).unwrap_or(SessionState::Closed)
    }

    /// Receiver that observes `true` once [`close`](Recipient::close) ran.
    pub fn closed(&self) -> watch::Receiver<bool> {
        self.close_tx.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        *self.close_tx.borrow()
    }

    fn set_name(&self, name: String) {
        let _ = self.name.set(name);
    }

    fn transition(&self, next: SessionState) {
        if let Ok(mut state) = self.state.lock() {
            debug!("{self}: {:?} -> {next:?}", *state);
            *state = next;
        }
    }

    /// Returns `true` for the first caller only.
    fn begin_cleanup(&self) -> bool {
        !self.cleaned_up.swap(true, Ordering::SeqCst)
    }

    /// Takes the write lock.  Deliveries from other sessions wait until the
    /// guard is dropped.
    async fn lock_writer(&self) -> WriterGuard<'_> {
        self.writer.lock().await
    }

    /// Writes one frame through an already held write lock.
    async fn write_locked(&self, guard: &mut WriterGuard<'_>, message: &ServerMessage) -> bool {
        let Some(writer) = guard.as_mut() else {
            return false;
        };
        let text = message.to_string();
        match timeout(self.write_timeout, write_frame(writer, &text)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("{self}: write of {} failed: {e}", message.kind());
                false
            }
            Err(_) => {
                warn!(
                    "{self}: write of {} timed out after {:?}",
                    message.kind(),
                    self.write_timeout
                );
                false
            }
        }
    }

    /// Writes `message` as the last frame and shuts the writer down under the
    /// same lock.  Every later delivery fails.
    async fn write_final(&self, guard: &mut WriterGuard<'_>, message: &ServerMessage) -> bool {
        let delivered = self.write_locked(guard, message).await;
        if let Some(mut writer) = guard.take() {
            if timeout(self.write_timeout, writer.shutdown()).await.is_err() {
                debug!("{self}: shutdown timed out");
            }
        }
        delivered
    }

    /// [`write_final`](Self::write_final) with a fresh lock.
    pub async fn send_final(&self, message: &ServerMessage) -> bool {
        let mut guard = self.lock_writer().await;
        self.write_final(&mut guard, message).await
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({name})", self.peer),
            None => write!(f, "{}", self.peer),
        }
    }
}

#[async_trait]
impl Recipient for ClientHandle {
    fn id(&self) -> SessionId {
        self.id
    }

    async fn deliver(&self, message: &ServerMessage) -> bool {
        let mut guard = self.lock_writer().await;
        self.write_locked(&mut guard, message).await
    }

    async fn close(&self) {
        // Wake the receive loop first; the writer lock may be held by a
        // delivery that is still waiting out its timeout.
        self.close_tx.send_replace(true);
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            if let Err(e) = timeout(self.write_timeout, writer.shutdown()).await {
                debug!("{self}: shutdown timed out: {e}");
            }
        }
    }
}

// ── Session context ───────────────────────────────────────────────────────────

/// Everything a session needs from the server, shared by all sessions.
#[derive(Clone)]
pub struct SessionContext {
    pub relay: Relay,
    pub config: Arc<ServerConfig>,
    pub running: Arc<AtomicBool>,
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Entry point for each per-connection task spawned by the accept loop.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, ctx: SessionContext) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("{peer}: set_nodelay failed: {e}");
    }
    let (reader, writer) = stream.into_split();
    serve_stream(reader, writer, peer, ctx).await;
}

/// Runs a whole session over any byte stream halves and always cleans up.
///
/// Returns once the session is `Closed`.
pub async fn serve_stream<R, W>(reader: R, writer: W, peer: SocketAddr, ctx: SessionContext)
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let handle = ClientHandle::new(peer, writer, ctx.config.write_timeout);

    let body = {
        let handle = Arc::clone(&handle);
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let mut reader = reader;
            run_session(&mut reader, &handle, &ctx).await
        })
    };

    match body.await {
        Ok(Ok(())) => info!("{handle}: session closed normally"),
        Ok(Err(e @ (SessionError::ClosedByServer | SessionError::ShuttingDown))) => {
            info!("{handle}: {e}")
        }
        Ok(Err(e)) => warn!("{handle}: session ended: {e}"),
        Err(e) => error!("{handle}: session task failed: {e}"),
    }

    cleanup(&handle, &ctx).await;
}

async fn run_session<R>(
    reader: &mut R,
    handle: &Arc<ClientHandle>,
    ctx: &SessionContext,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    handle.transition(SessionState::Handshaking);
    let name = handshake(reader, handle, ctx).await?;
    handle.transition(SessionState::Active);
    receive_loop(reader, handle, ctx, &name).await
}

/// Reads the proposed name, registers it, and announces the new user.
async fn handshake<R>(
    reader: &mut R,
    handle: &Arc<ClientHandle>,
    ctx: &SessionContext,
) -> Result<String, SessionError>
where
    R: AsyncRead + Unpin,
{
    let limit = ctx.config.handshake_timeout;
    let raw = timeout(limit, read_frame(reader))
        .await
        .map_err(|_| SessionError::HandshakeTimeout(limit))??;
    if raw.is_empty() {
        return Err(SessionError::EmptyHandshake);
    }

    let proposed = match normalize_username(&raw) {
        Ok(name) => name,
        Err(e) => {
            handle.send_final(&ServerMessage::error(INVALID_USERNAME)).await;
            return Err(e.into());
        }
    };

    // The write lock is held from before registration until the welcome is
    // written, so broadcasts that already see this session queue behind it.
    // Lock order is writer then registry; the relay never holds the registry
    // lock while writing.
    let mut writer = handle.lock_writer().await;
    let recipient: Arc<dyn Recipient> = handle.clone();
    let (name, user_count) = ctx.relay.registry().join(recipient, &proposed).await;
    handle.set_name(name.clone());

    // Shutdown may have drained the registry between accept and register.
    if !ctx.running.load(Ordering::SeqCst) {
        handle
            .write_final(&mut writer, &ServerMessage::shutdown())
            .await;
        return Err(SessionError::ShuttingDown);
    }

    info!("{handle}: joined ({user_count} online)");
    let welcome = ServerMessage::Welcome {
        name: name.clone(),
        user_count,
    };
    let welcomed = handle.write_locked(&mut writer, &welcome).await;
    drop(writer);
    if !welcomed {
        return Err(SessionError::ReplyFailed);
    }

    ctx.relay
        .broadcast(&ServerMessage::Joined { name: name.clone() }, Some(handle.id()))
        .await;
    Ok(name)
}

/// Handles frames from an active session until it exits or is closed.
async fn receive_loop<R>(
    reader: &mut R,
    handle: &Arc<ClientHandle>,
    ctx: &SessionContext,
    name: &str,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut closed = handle.closed();

    loop {
        let frame = tokio::select! {
            frame = read_frame(reader) => frame,
            _ = wait_closed(&mut closed) => return Err(SessionError::ClosedByServer),
        };

        let text = match frame {
            Ok(text) => text,
            Err(e) if e.is_end_of_stream() => {
                debug!("{handle}: peer closed the connection");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if is_exit_request(&text) {
            // Nothing may follow the farewell: leave the registry, then close
            // the writer in the same lock as the last frame.
            ctx.relay.registry().unregister(handle.id()).await;
            handle.send_final(&ServerMessage::Goodbye).await;
            return Ok(());
        }

        if exceeds_message_limit(&text) {
            reply(handle, &ServerMessage::error(MESSAGE_TOO_LONG)).await?;
            continue;
        }

        if is_command(&text) {
            let invoker = Invoker {
                id: handle.id(),
                name,
            };
            let response = handle_command_line(&text, invoker, &ctx.relay).await;
            reply(handle, &response).await?;
            continue;
        }

        if text.trim().is_empty() {
            continue;
        }

        let message = ServerMessage::Chat {
            from: name.to_string(),
            text,
        };
        ctx.relay.broadcast(&message, Some(handle.id())).await;
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    while !*closed.borrow_and_update() {
        if closed.changed().await.is_err() {
            return;
        }
    }
}

async fn reply(handle: &ClientHandle, message: &ServerMessage) -> Result<(), SessionError> {
    if handle.deliver(message).await {
        Ok(())
    } else {
        Err(SessionError::ReplyFailed)
    }
}

/// `Closing -> Closed`.  Runs on every exit path; only the first call acts.
async fn cleanup(handle: &Arc<ClientHandle>, ctx: &SessionContext) {
    if !handle.begin_cleanup() {
        return;
    }
    handle.transition(SessionState::Closing);

    ctx.relay.registry().unregister(handle.id()).await;
    if let Some(name) = handle.name() {
        if ctx.running.load(Ordering::SeqCst) {
            let left = ServerMessage::Left {
                name: name.to_string(),
            };
            ctx.relay.broadcast(&left, Some(handle.id())).await;
        }
    }

    handle.close().await;
    handle.transition(SessionState::Closed);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
