//! Conversation → live connection fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::{ClientConnection, ConnectionId};
use crate::domain::entities::{ConversationId, Message};
use crate::domain::frames::{self, Payload};

#[derive(Default)]
struct Subscriptions {
    by_conversation: HashMap<ConversationId, HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Reverse index so a connection can leave without naming its conversation
    by_connection: HashMap<ConnectionId, ConversationId>,
}

impl Subscriptions {
    fn remove(&mut self, connection_id: ConnectionId) -> Option<ConversationId> {
        let conversation_id = self.by_connection.remove(&connection_id)?;
        if let Some(set) = self.by_conversation.get_mut(&conversation_id) {
            let _ = set.remove(&connection_id);
            if set.is_empty() {
                let _ = self.by_conversation.remove(&conversation_id);
            }
        }
        Some(conversation_id)
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadcastReport {
    /// Connections in the snapshot
    pub recipients: usize,
    pub delivered: usize,
    /// Connections that failed and were deregistered
    pub failed: Vec<ConnectionId>,
}

/// Tracks which live connections receive which conversation's messages.
///
/// One registry per server; tests create as many independent ones as they
/// like. All membership changes and the broadcast snapshot go through a
/// single lock, and no lock is held while sending.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Subscriptions>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `connection` to `conversation_id`.
    ///
    /// Idempotent. A connection belongs to at most one conversation, so
    /// registering it elsewhere moves it.
    pub async fn register(&self, conversation_id: ConversationId, connection: Arc<ClientConnection>) {
        let mut subs = self.inner.write().await;
        let connection_id = connection.id;

        if subs.by_connection.get(&connection_id) != Some(&conversation_id) {
            let _ = subs.remove(connection_id);
            let _ = subs.by_connection.insert(connection_id, conversation_id);
        }
        let _ = subs
            .by_conversation
            .entry(conversation_id)
            .or_default()
            .insert(connection_id, connection);

        debug!(%connection_id, conversation_id, "connection registered");
    }

    /// Remove a connection wherever it is registered.
    ///
    /// Safe to call repeatedly or for connections that never registered.
    /// Returns the conversation it was removed from.
    pub async fn deregister(&self, connection_id: ConnectionId) -> Option<ConversationId> {
        let removed = self.inner.write().await.remove(connection_id);
        if let Some(conversation_id) = removed {
            debug!(%connection_id, conversation_id, "connection deregistered");
        }
        removed
    }

    /// Serialize `messages` once and deliver them as one frame to every
    /// connection registered for the conversation.
    pub async fn broadcast(&self, conversation_id: ConversationId, messages: &[Message]) -> BroadcastReport {
        match frames::encode_messages(messages) {
            Ok(payload) => self.broadcast_payload(conversation_id, payload).await,
            Err(e) => {
                warn!(conversation_id, error = %e, "failed to serialize broadcast");
                BroadcastReport::default()
            }
        }
    }

    /// Deliver a pre-serialized frame to the conversation's current subscribers.
    ///
    /// Recipients are snapshotted before sending. A failed send evicts and
    /// deregisters that connection without affecting the others; an empty
    /// subscriber set is a no-op.
    pub async fn broadcast_payload(&self, conversation_id: ConversationId, payload: Payload) -> BroadcastReport {
        let snapshot: Vec<Arc<ClientConnection>> = {
            let subs = self.inner.read().await;
            match subs.by_conversation.get(&conversation_id) {
                Some(set) => set.values().cloned().collect(),
                None => Vec::new(),
            }
        };

        let mut report = BroadcastReport {
            recipients: snapshot.len(),
            ..Default::default()
        };
        if snapshot.is_empty() {
            debug!(conversation_id, "no live connections, broadcast skipped");
            return report;
        }

        for conn in &snapshot {
            match conn.send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(connection_id = %conn.id, conversation_id, error = %e, "failed to deliver broadcast");
                    conn.evict();
                    report.failed.push(conn.id);
                }
            }
        }

        if !report.failed.is_empty() {
            let mut subs = self.inner.write().await;
            for connection_id in &report.failed {
                let _ = subs.remove(*connection_id);
            }
        }

        debug!(
            conversation_id,
            recipients = report.recipients,
            delivered = report.delivered,
            "broadcast messages to conversation"
        );
        report
    }

    /// Live connections registered for a conversation
    pub async fn subscriber_count(&self, conversation_id: ConversationId) -> usize {
        self.inner
            .read()
            .await
            .by_conversation
            .get(&conversation_id)
            .map_or(0, HashMap::len)
    }

    /// Conversations with at least one live connection
    pub async fn conversation_count(&self) -> usize {
        self.inner.read().await.by_conversation.len()
    }

    /// Registered connections across all conversations
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.by_connection.len()
    }

    pub async fn conversation_of(&self, connection_id: ConnectionId) -> Option<ConversationId> {
        self.inner.read().await.by_connection.get(&connection_id).copied()
    }
}
