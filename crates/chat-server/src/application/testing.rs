//! Test doubles shared by the application-layer unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_core::{ServerMessage, SessionId};
use uuid::Uuid;

use super::registry::Recipient;

/// A recipient that records every message it accepts.
///
/// Starts healthy; [`failing`](Self::failing) builds one whose deliveries all
/// fail, which is how a dead connection looks to the relay.
pub(crate) struct RecordingRecipient {
    id: SessionId,
    received: Mutex<Vec<ServerMessage>>,
    fail: bool,
    closed: AtomicBool,
}

impl RecordingRecipient {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            received: Mutex::new(Vec::new()),
            fail: false,
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            received: Mutex::new(Vec::new()),
            fail: true,
            closed: AtomicBool::new(false),
        })
    }

    /// Every accepted message, rendered as it would appear on the wire.
    pub(crate) fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recipient for RecordingRecipient {
    fn id(&self) -> SessionId {
        self.id
    }

    async fn deliver(&self, message: &ServerMessage) -> bool {
        if self.fail || self.is_closed() {
            return false;
        }
        self.received.lock().unwrap().push(message.clone());
        true
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
