//! Conversation Store: the durable log of conversations and messages
//!
//! [`ConversationStore`] is the contract the relay consumes. Postgres backs
//! it in production ([`ConversationsRepositories`]); [`InMemoryConversationStore`]
//! serves tests and database-less local runs.

pub mod conversations;
pub mod memory;
pub mod messages;

use sqlx::PgPool;

use crate::domain::entities::{Conversation, ConversationId, Message, NewConversation, NewMessage};
use aurora_common::Result;

pub use conversations::ConversationRepository;
pub use memory::InMemoryConversationStore;
pub use messages::MessageRepository;

/// Durable, append-only conversation log.
///
/// The store is the sole authority on message identity and ordering.
/// Implementations must tolerate concurrent callers.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, new: NewConversation) -> Result<Conversation>;

    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>>;

    /// Messages of a conversation, oldest first
    async fn get_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>>;

    async fn create_message(&self, new: NewMessage) -> Result<Message>;

    /// Store the token only if none is set. Returns whether it was written.
    async fn update_continuation_token(&self, id: ConversationId, token: &str) -> Result<bool>;
}

/// Combined repository access for the Conversations domain
#[derive(Clone)]
pub struct ConversationsRepositories {
    pool: PgPool,
    pub conversations: ConversationRepository,
    pub messages: MessageRepository,
}

impl ConversationsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            pool,
        }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| aurora_common::Error::Internal(format!("migration failed: {}", e)))?;
        Ok(())
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ConversationStore for ConversationsRepositories {
    async fn create_conversation(&self, new: NewConversation) -> Result<Conversation> {
        self.conversations.create(&new).await
    }

    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>> {
        self.conversations.find(id).await
    }

    async fn get_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>> {
        self.messages.list_by_conversation(conversation_id).await
    }

    async fn create_message(&self, new: NewMessage) -> Result<Message> {
        self.messages.create(&new).await
    }

    async fn update_continuation_token(&self, id: ConversationId, token: &str) -> Result<bool> {
        self.conversations.set_continuation_token(id, token).await
    }
}
