//! Conversation repository

use crate::domain::entities::{Conversation, ConversationId, NewConversation};
use aurora_common::Result;
use sqlx::PgPool;

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find conversation by ID
    pub async fn find(&self, id: ConversationId) -> Result<Option<Conversation>> {
        let conv = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, name, is_ai_companion, continuation_token, created_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conv)
    }

    /// Create a new conversation; the database assigns the id
    pub async fn create(&self, new: &NewConversation) -> Result<Conversation> {
        let created = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (name, is_ai_companion)
            VALUES ($1, $2)
            RETURNING id, name, is_ai_companion, continuation_token, created_at
            "#,
        )
        .bind(&new.name)
        .bind(new.is_ai_companion)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Set the continuation token unless one is already stored.
    ///
    /// Returns whether this call wrote it.
    pub async fn set_continuation_token(&self, id: ConversationId, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET continuation_token = $2
            WHERE id = $1 AND continuation_token IS NULL
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
