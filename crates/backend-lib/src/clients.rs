// ============================
// crates/backend-lib/src/clients.rs
// ============================
//! Registry of live connections and their outbound queues.
//!
//! Each queue is bounded and nothing here ever waits on it. High-rate relays
//! (`playerStateUpdate`) may only fill the queue down to a reserved quarter;
//! that reserve is kept for room lifecycle frames, so a client flooded with
//! position updates still receives `gameStarted` or `playerLeft`.
use dashmap::DashMap;
use metrics::counter;
use sledrun_common::{ClientId, ServerMessage};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::metrics as keys;

/// How a frame may be treated when the recipient's queue is backed up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Lifecycle frames; may use the whole queue
    Reliable,
    /// Superseded by the next update anyway; dropped once the reserve is reached
    BestEffort,
}

/// Outbound half of every open WebSocket, keyed by connection id
#[derive(Default)]
pub struct ClientRegistry {
    senders: DashMap<ClientId, mpsc::Sender<ServerMessage>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: &str, tx: mpsc::Sender<ServerMessage>) {
        self.senders.insert(id.to_string(), tx);
    }

    pub fn unregister(&self, id: &str) {
        self.senders.remove(id);
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Queue a lifecycle message for one connection without waiting.
    ///
    /// Returns false when the connection is gone or its queue is completely
    /// full; the message is dropped in both cases.
    pub fn send_to(&self, id: &str, msg: ServerMessage) -> bool {
        self.deliver(id, msg, Delivery::Reliable)
    }

    /// Queue `msg` for one connection under the given delivery class
    pub fn deliver(&self, id: &str, msg: ServerMessage, delivery: Delivery) -> bool {
        // Clone the sender so no shard lock is held while sending
        let Some(tx) = self.senders.get(id).map(|entry| entry.value().clone()) else {
            debug!(client = id, "send to unknown client skipped");
            return false;
        };
        if delivery == Delivery::BestEffort && tx.capacity() <= tx.max_capacity() / 4 {
            counter!(keys::RELAY_DROPPED).increment(1);
            debug!(client = id, "outbound queue backed up, dropping relay");
            return false;
        }
        match tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                counter!(keys::RELAY_DROPPED).increment(1);
                warn!(client = id, ?delivery, "outbound queue full, dropping message");
                false
            },
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Send `msg` to each of `ids` except `except`. Returns the number queued.
    pub fn broadcast<'a, I>(
        &self,
        ids: I,
        msg: &ServerMessage,
        except: Option<&str>,
        delivery: Delivery,
    ) -> usize
    where
        I: IntoIterator<Item = &'a ClientId>,
    {
        ids.into_iter()
            .filter(|id| Some(id.as_str()) != except)
            .filter(|id| self.deliver(id, msg.clone(), delivery))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(message: &str) -> ServerMessage {
        ServerMessage::ChatMessage {
            id: "x".to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_skips_excluded() {
        let registry = ClientRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        registry.register("a", tx_a);
        registry.register("b", tx_b);

        let ids = vec!["a".to_string(), "b".to_string(), "ghost".to_string()];
        let sent = registry.broadcast(&ids, &chat("hi"), Some("a"), Delivery::Reliable);

        assert_eq!(sent, 1);
        assert_eq!(rx_b.recv().await, Some(chat("hi")));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let registry = ClientRegistry::new();
        let (tx, mut rx) = mpsc::channel(1);
        registry.register("slow", tx);

        assert!(registry.send_to("slow", chat("first")));
        assert!(!registry.send_to("slow", chat("second")));
        assert_eq!(rx.recv().await, Some(chat("first")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relays_leave_room_for_lifecycle_frames() {
        let registry = ClientRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);
        registry.register("racer", tx);

        // One of four slots is held back from relays
        for _ in 0..3 {
            assert!(registry.deliver("racer", chat("pos"), Delivery::BestEffort));
        }
        assert!(!registry.deliver("racer", chat("pos"), Delivery::BestEffort));

        let started = ServerMessage::Connected {
            id: "started".to_string(),
        };
        assert!(registry.send_to("racer", started.clone()));

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(chat("pos")));
        }
        assert_eq!(rx.recv().await, Some(started));
    }

    #[test]
    fn test_unregister() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.register("a", tx);
        assert_eq!(registry.len(), 1);
        registry.unregister("a");
        assert!(registry.is_empty());
        assert!(!registry.send_to("a", chat("gone")));
    }
}
