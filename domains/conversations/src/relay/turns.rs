//! Per-conversation turn serialization

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::domain::entities::ConversationId;

/// One async lock per conversation with turns in flight.
///
/// Entries are created on demand and pruned when the last holder or
/// waiter lets go, so idle conversations cost nothing.
#[derive(Default)]
pub struct TurnLocks {
    locks: Mutex<HashMap<ConversationId, Arc<tokio::sync::Mutex<()>>>>,
}

/// Held for the duration of one turn
pub struct TurnGuard<'a> {
    owner: &'a TurnLocks,
    conversation_id: ConversationId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn for `conversation_id` is running
    pub async fn acquire(&self, conversation_id: ConversationId) -> TurnGuard<'_> {
        let lock = self
            .locks
            .lock()
            .entry(conversation_id)
            .or_default()
            .clone();

        let guard = lock.lock_owned().await;
        TurnGuard {
            owner: self,
            conversation_id,
            guard: Some(guard),
        }
    }

    /// Conversations with a turn running or queued
    #[cfg(test)]
    fn active(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        // Release first so the strong count below only sees other turns.
        drop(self.guard.take());

        let mut locks = self.owner.locks.lock();
        if let Some(lock) = locks.get(&self.conversation_id) {
            if Arc::strong_count(lock) == 1 {
                let _ = locks.remove(&self.conversation_id);
            }
        }
    }
}
