//! A live client connection as seen by the registry.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::frames::Payload;

/// Process-unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn_{}", self.0.simple())
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection closed")]
    Closed,

    #[error("outbound queue full")]
    Backpressure,
}

/// Sending half of one client's outbound queue.
///
/// The transport's writer task owns the receiving half; sends never block.
pub struct ClientConnection {
    pub id: ConnectionId,
    tx: mpsc::Sender<Payload>,
    connected_at: Instant,
    last_seen: Mutex<Instant>,
    dropped: AtomicU64,
    evicted: AtomicBool,
    evict_notify: Notify,
}

impl ClientConnection {
    pub fn new(tx: mpsc::Sender<Payload>) -> Self {
        let now = Instant::now();
        Self {
            id: ConnectionId::new(),
            tx,
            connected_at: now,
            last_seen: Mutex::new(now),
            dropped: AtomicU64::new(0),
            evicted: AtomicBool::new(false),
            evict_notify: Notify::new(),
        }
    }

    /// Create a connection together with its bounded outbound queue
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Queue a frame for the client without waiting
    pub fn send(&self, payload: Payload) -> Result<(), DeliveryError> {
        self.tx.try_send(payload).map_err(|e| {
            let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
            match e {
                TrySendError::Closed(_) => DeliveryError::Closed,
                TrySendError::Full(_) => DeliveryError::Backpressure,
            }
        })
    }

    /// Ask the transport to shut this connection down.
    ///
    /// Called after a failed delivery; the client must reconnect and refetch.
    pub fn evict(&self) {
        if !self.evicted.swap(true, Ordering::SeqCst) {
            self.evict_notify.notify_one();
        }
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted.load(Ordering::SeqCst)
    }

    /// Resolves once [`evict`](Self::evict) has been called. Single waiter.
    pub async fn evicted(&self) {
        self.evict_notify.notified().await;
    }

    /// Frames that could not be queued
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Record inbound activity (any frame, including pongs)
    pub fn mark_seen(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }

    #[mutants::skip] // Only reported in the disconnect log line
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
