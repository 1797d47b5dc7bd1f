//! Relay: fan-out of one message to many sessions, and private delivery.
//!
//! # Failure isolation
//!
//! A broadcast works on a [`snapshot`](Registry::snapshot) of the registry, so
//! the registry lock is never held across a network write.  Recipients are
//! visited in registration order and every failure is collected rather than
//! returned early; only after the fan-out are the failed sessions
//! unregistered and closed.  One dead connection therefore never keeps a
//! message from reaching the others.
//!
//! Ordering: the sender's session awaits each broadcast before handling its
//! next frame, so one sender's messages reach each recipient in order.

use std::sync::Arc;

use chat_core::{ServerMessage, SessionId};
use tracing::{debug, warn};

use super::registry::{Registry, RegistryEntry};

/// Outcome of one [`Relay::broadcast`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients that accepted the message.
    pub delivered: usize,
    /// Sessions whose delivery failed and that were removed.
    pub evicted: Vec<SessionId>,
}

/// Delivery engine over a shared [`Registry`].
#[derive(Clone)]
pub struct Relay {
    registry: Arc<Registry>,
}

impl Relay {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Delivers `message` to every registered session except `sender`.
    ///
    /// Sessions whose delivery fails are unregistered and closed once the
    /// fan-out is complete.
    pub async fn broadcast(
        &self,
        message: &ServerMessage,
        sender: Option<SessionId>,
    ) -> BroadcastReport {
        let targets = self.registry.snapshot().await;

        let mut delivered = 0;
        let mut failed = Vec::new();
        for entry in targets.into_iter().filter(|e| Some(e.id) != sender) {
            if entry.recipient.deliver(message).await {
                delivered += 1;
            } else {
                warn!(
                    "broadcast of {} to '{}' ({}) failed",
                    message.kind(),
                    entry.name,
                    entry.id
                );
                failed.push(entry);
            }
        }

        let mut evicted = Vec::with_capacity(failed.len());
        for entry in failed {
            self.evict(&entry).await;
            evicted.push(entry.id);
        }

        debug!(
            "broadcast {}: delivered={delivered} evicted={}",
            message.kind(),
            evicted.len()
        );
        BroadcastReport { delivered, evicted }
    }

    /// Delivers `message` to one session, evicting it if the write fails.
    pub async fn send_private(&self, target: &RegistryEntry, message: &ServerMessage) -> bool {
        if target.recipient.deliver(message).await {
            return true;
        }
        warn!(
            "private {} to '{}' ({}) failed",
            message.kind(),
            target.name,
            target.id
        );
        self.evict(target).await;
        false
    }

    async fn evict(&self, entry: &RegistryEntry) {
        self.registry.unregister(entry.id).await;
        entry.recipient.close().await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::{MockRecipient, Recipient};
    use crate::application::testing::RecordingRecipient;
    use uuid::Uuid;

    fn chat(from: &str, text: &str) -> ServerMessage {
        ServerMessage::Chat {
            from: from.into(),
            text: text.into(),
        }
    }

    fn dead_recipient(id: SessionId) -> MockRecipient {
        let mut mock = MockRecipient::new();
        mock.expect_id().return_const(id);
        mock.expect_deliver().times(1).returning(|_| false);
        mock.expect_close().times(1).return_const(());
        mock
    }

    #[tokio::test]
    async fn test_broadcast_skips_sender() {
        // Arrange
        let registry = Arc::new(Registry::new());
        let a = RecordingRecipient::new();
        let b = RecordingRecipient::new();
        let c = RecordingRecipient::new();
        registry.register(a.clone(), "A").await;
        registry.register(b.clone(), "B").await;
        registry.register(c.clone(), "C").await;
        let relay = Relay::new(Arc::clone(&registry));

        // Act
        let report = relay.broadcast(&chat("A", "hi"), Some(a.id())).await;

        // Assert
        assert_eq!(report.delivered, 2);
        assert!(report.evicted.is_empty());
        assert!(a.received().is_empty());
        assert_eq!(b.received(), ["[A]: hi"]);
        assert_eq!(c.received(), ["[A]: hi"]);
    }

    #[tokio::test]
    async fn test_broadcast_without_sender_reaches_everyone() {
        let registry = Arc::new(Registry::new());
        let a = RecordingRecipient::new();
        let b = RecordingRecipient::new();
        registry.register(a.clone(), "A").await;
        registry.register(b.clone(), "B").await;
        let relay = Relay::new(registry);

        let report = relay.broadcast(&ServerMessage::shutdown(), None).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(a.received().len(), 1);
        assert_eq!(b.received().len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_isolates_dead_recipient() {
        // Arrange: the dead session sits between two live ones
        let registry = Arc::new(Registry::new());
        let sender = RecordingRecipient::new();
        let first = RecordingRecipient::new();
        let dead_id = Uuid::new_v4();
        let last = RecordingRecipient::new();
        registry.register(sender.clone(), "S").await;
        registry.register(first.clone(), "first").await;
        registry
            .register(Arc::new(dead_recipient(dead_id)), "dead")
            .await;
        registry.register(last.clone(), "last").await;
        let relay = Relay::new(Arc::clone(&registry));

        // Act
        let report = relay.broadcast(&chat("S", "still here?"), Some(sender.id())).await;

        // Assert
        assert_eq!(report.delivered, 2);
        assert_eq!(report.evicted, vec![dead_id]);
        assert_eq!(first.received(), ["[S]: still here?"]);
        assert_eq!(last.received(), ["[S]: still here?"]);
        assert_eq!(registry.list_names().await, ["S", "first", "last"]);
    }

    #[tokio::test]
    async fn test_broadcast_evicts_closed_recording_recipient() {
        let registry = Arc::new(Registry::new());
        let live = RecordingRecipient::new();
        let closed = RecordingRecipient::failing();
        registry.register(live.clone(), "live").await;
        registry.register(closed.clone(), "closed").await;
        let relay = Relay::new(Arc::clone(&registry));

        let report = relay.broadcast(&chat("x", "y"), None).await;

        assert_eq!(report.evicted, vec![closed.id()]);
        assert!(closed.is_closed());
        assert!(!live.is_closed());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_registry_is_noop() {
        let relay = Relay::new(Arc::new(Registry::new()));
        let report = relay.broadcast(&chat("x", "y"), None).await;
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_send_private_delivers_to_target_only() {
        let registry = Arc::new(Registry::new());
        let target = RecordingRecipient::new();
        let bystander = RecordingRecipient::new();
        registry.register(target.clone(), "B").await;
        registry.register(bystander.clone(), "C").await;
        let relay = Relay::new(Arc::clone(&registry));
        let entry = registry.find_by_name("B").await.unwrap();

        let ok = relay
            .send_private(
                &entry,
                &ServerMessage::PrivateFrom {
                    from: "A".into(),
                    text: "secret".into(),
                },
            )
            .await;

        assert!(ok);
        assert_eq!(target.received(), ["[PRIVATE from A]: secret"]);
        assert!(bystander.received().is_empty());
    }

    #[tokio::test]
    async fn test_send_private_failure_evicts_target() {
        let registry = Arc::new(Registry::new());
        let dead_id = Uuid::new_v4();
        registry
            .register(Arc::new(dead_recipient(dead_id)), "ghost")
            .await;
        let relay = Relay::new(Arc::clone(&registry));
        let entry = registry.find_by_name("ghost").await.unwrap();

        let ok = relay.send_private(&entry, &chat("A", "boo")).await;

        assert!(!ok);
        assert!(registry.is_empty().await);
    }
}
