//! Message repository

use crate::domain::entities::{ConversationId, Message, NewMessage};
use aurora_common::Result;
use sqlx::PgPool;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List messages for a conversation, oldest first
    pub async fn list_by_conversation(&self, conversation_id: ConversationId) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Append a message; id and timestamp come from the database
    pub async fn create(&self, msg: &NewMessage) -> Result<Message> {
        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, role, content, created_at
            "#,
        )
        .bind(msg.conversation_id)
        .bind(msg.role)
        .bind(&msg.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
