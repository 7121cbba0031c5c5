//! Broadcast hub: fans every outbound frame out to all connected listeners.
//!
//! Each listener gets its own bounded queue. A slow listener loses frames
//! when its queue is full; it never blocks the simulation or other listeners.

use crate::types::ServerMessage;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

pub struct Hub {
    listeners: RwLock<HashMap<Uuid, mpsc::Sender<ServerMessage>>>,
    queue: usize,
}

impl Hub {
    /// `queue` is the per-listener buffer depth.
    pub fn new(queue: usize) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            queue: queue.max(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, mpsc::Sender<ServerMessage>>> {
        self.listeners.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, mpsc::Sender<ServerMessage>>> {
        self.listeners.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscribe(&self) -> (Uuid, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(self.queue);
        let id = Uuid::new_v4();
        self.write().insert(id, tx);
        tracing::debug!(listener = %id, "Listener subscribed");
        (id, rx)
    }

    pub fn unsubscribe(&self, id: Uuid) -> bool {
        let removed = self.write().remove(&id).is_some();
        if removed {
            tracing::debug!(listener = %id, "Listener unsubscribed");
        }
        removed
    }

    /// Offer `msg` to every listener. Returns how many accepted it.
    pub fn broadcast(&self, msg: &ServerMessage) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in self.read().iter() {
            match tx.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(listener = %id, "Listener queue full, dropping {} frame", msg.kind);
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }
        if !closed.is_empty() {
            let mut listeners = self.write();
            for id in closed {
                listeners.remove(&id);
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use soma_reasoning::{Entry, Source};

    fn frame(text: &str) -> ServerMessage {
        ServerMessage::from(&Entry::new(Source::Sense, text, Utc::now()))
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_listeners() {
        let hub = Hub::new(8);
        let (_a, mut rx_a) = hub.subscribe();
        let (_b, mut rx_b) = hub.subscribe();
        assert_eq!(hub.broadcast(&frame("hello")), 2);
        assert_eq!(rx_a.recv().await.unwrap().content, "hello");
        assert_eq!(rx_b.recv().await.unwrap().content, "hello");
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let hub = Hub::new(2);
        let (_slow, mut rx_slow) = hub.subscribe();
        for i in 0..5 {
            hub.broadcast(&frame(&format!("f{}", i)));
        }
        assert_eq!(rx_slow.recv().await.unwrap().content, "f0");
        assert_eq!(rx_slow.recv().await.unwrap().content, "f1");
        assert!(rx_slow.try_recv().is_err());
        // still subscribed
        assert_eq!(hub.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_closed_listener_is_pruned() {
        let hub = Hub::new(4);
        let (_gone, rx) = hub.subscribe();
        let (kept, _rx_kept) = hub.subscribe();
        drop(rx);
        assert_eq!(hub.broadcast(&frame("x")), 1);
        assert_eq!(hub.listener_count(), 1);
        assert!(hub.unsubscribe(kept));
        assert!(!hub.unsubscribe(kept));
        assert_eq!(hub.broadcast(&frame("y")), 0);
    }
}
