//! In-process conversation store

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use super::ConversationStore;
use crate::domain::entities::{Conversation, ConversationId, Message, NewConversation, NewMessage};
use aurora_common::Result;

#[derive(Default)]
struct Inner {
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
    next_conversation_id: i64,
    next_message_id: i64,
}

/// Volatile [`ConversationStore`]; contents are lost on restart
#[derive(Default)]
pub struct InMemoryConversationStore {
    inner: RwLock<Inner>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total messages across all conversations
    pub fn message_count(&self) -> usize {
        self.inner.read().messages.values().map(Vec::len).sum()
    }
}

/// Strictly after the previous message of the same conversation
fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(&self, new: NewConversation) -> Result<Conversation> {
        let mut inner = self.inner.write();
        inner.next_conversation_id += 1;

        let conversation = Conversation {
            id: inner.next_conversation_id,
            name: new.name,
            is_ai_companion: new.is_ai_companion,
            continuation_token: None,
            created_at: Utc::now(),
        };
        inner
            .conversations
            .insert(conversation.id, conversation.clone());

        Ok(conversation)
    }

    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>> {
        Ok(self.inner.read().conversations.get(&id).cloned())
    }

    async fn get_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>> {
        Ok(self
            .inner
            .read()
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_message(&self, new: NewMessage) -> Result<Message> {
        let mut inner = self.inner.write();
        inner.next_message_id += 1;
        let id = inner.next_message_id;

        let log = inner.messages.entry(new.conversation_id).or_default();
        let message = Message {
            id,
            conversation_id: new.conversation_id,
            role: new.role,
            content: new.content,
            created_at: next_timestamp(log.last().map(|m| m.created_at)),
        };
        log.push(message.clone());

        Ok(message)
    }

    async fn update_continuation_token(&self, id: ConversationId, token: &str) -> Result<bool> {
        let mut inner = self.inner.write();
        match inner.conversations.get_mut(&id) {
            Some(conversation) if conversation.continuation_token.is_none() => {
                conversation.continuation_token = Some(token.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
