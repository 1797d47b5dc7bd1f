//! Registry: the shared directory of live sessions and their display names.
//!
//! The registry is the only state shared between session tasks.  Every read
//! or mutation goes through one `tokio::sync::Mutex`, held for the map
//! operation only.  Callers that need to write to the network take a
//! [`snapshot`](Registry::snapshot) and deliver after the lock is released,
//! so a slow peer never stalls registration or lookup for everyone else.
//!
//! Entries are kept in registration order, which is also the order broadcasts
//! visit recipients.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chat_core::{ServerMessage, SessionId};
use tokio::sync::Mutex;
use tracing::debug;

/// The delivery side of a session, as seen by other sessions.
///
/// The infrastructure implementation writes a frame to a TCP connection; test
/// implementations record what they were sent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Recipient: Send + Sync {
    /// Identity of the session behind this handle.
    fn id(&self) -> SessionId;

    /// Sends one message.  Returns `false` on any failure, including when the
    /// session has already been closed.  Never panics.
    async fn deliver(&self, message: &ServerMessage) -> bool;

    /// Closes the connection and wakes the session's receive loop.
    ///
    /// Idempotent.
    async fn close(&self);
}

/// One registered session.
#[derive(Clone)]
pub struct RegistryEntry {
    pub id: SessionId,
    pub name: String,
    pub recipient: Arc<dyn Recipient>,
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// In-memory registry of all sessions that completed the handshake.
#[derive(Default)]
pub struct Registry {
    entries: Mutex<Vec<RegistryEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `recipient` under a unique version of `proposed` and returns
    /// the name actually assigned.
    ///
    /// Names compare case-sensitively.  If `proposed` is taken, the first
    /// free `proposed_1`, `proposed_2`, … is used.  The uniqueness check and
    /// the insert happen under one lock acquisition.
    pub async fn register(&self, recipient: Arc<dyn Recipient>, proposed: &str) -> String {
        self.join(recipient, proposed).await.0
    }

    /// Like [`register`](Self::register), also returning the number of
    /// registered sessions right after the insert.
    pub async fn join(&self, recipient: Arc<dyn Recipient>, proposed: &str) -> (String, usize) {
        let mut entries = self.entries.lock().await;

        let taken = |candidate: &str| entries.iter().any(|e| e.name == candidate);
        let name = if !taken(proposed) {
            proposed.to_string()
        } else {
            (1u64..)
                .map(|n| format!("{proposed}_{n}"))
                .find(|candidate| !taken(candidate))
                .unwrap_or_else(|| proposed.to_string())
        };

        let id = recipient.id();
        entries.push(RegistryEntry {
            id,
            name: name.clone(),
            recipient,
        });
        let count = entries.len();
        debug!("registered session {id} as '{name}' ({count} online)");
        (name, count)
    }

    /// Removes the entry for `id`, returning its name.  No-op if absent.
    pub async fn unregister(&self, id: SessionId) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let index = entries.iter().position(|e| e.id == id)?;
        let entry = entries.remove(index);
        debug!("unregistered session {id} ('{}')", entry.name);
        Some(entry.name)
    }

    /// Point-in-time copy of every entry, in registration order.
    pub async fn snapshot(&self) -> Vec<RegistryEntry> {
        self.entries.lock().await.clone()
    }

    /// Looks up a session by display name, ignoring case.
    ///
    /// When several names differ only by case, an exact match wins; otherwise
    /// the earliest registration wins.
    pub async fn find_by_name(&self, name: &str) -> Option<RegistryEntry> {
        let entries = self.entries.lock().await;
        if let Some(exact) = entries.iter().find(|e| e.name == name) {
            return Some(exact.clone());
        }
        let wanted = name.to_lowercase();
        entries
            .iter()
            .find(|e| e.name.to_lowercase() == wanted)
            .cloned()
    }

    /// Display names in registration order.
    pub async fn list_names(&self) -> Vec<String> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Removes and returns every entry.  Used by shutdown.
    pub async fn drain(&self) -> Vec<RegistryEntry> {
        std::mem::take(&mut *self.entries.lock().await)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
