//! Message coaching: score a draft before it is sent

use std::sync::Arc;

use aurora_common::{Error, Result};
use aurora_llm::{MessageScore, ResponseGenerator, ScoreRequest, SubjectAttributes};

use crate::domain::entities::{validate_content, validate_conversation_id, ConversationId};
use crate::repository::ConversationStore;

/// Rates how well a draft message connects with its recipient
pub struct MessageCoach {
    store: Arc<dyn ConversationStore>,
    generator: Arc<dyn ResponseGenerator>,
    history_window: usize,
}

impl MessageCoach {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        generator: Arc<dyn ResponseGenerator>,
        history_window: usize,
    ) -> Self {
        Self {
            store,
            generator,
            history_window,
        }
    }

    /// Score `content`, optionally in the context of an existing conversation.
    ///
    /// Only validation and store failures are errors. Scoring itself always
    /// produces a result.
    pub async fn analyze(
        &self,
        content: &str,
        conversation_id: Option<ConversationId>,
        subject: Option<SubjectAttributes>,
    ) -> Result<MessageScore> {
        validate_content(content)?;

        let history = match conversation_id {
            Some(id) => {
                validate_conversation_id(id)?;
                if self.store.get_conversation(id).await?.is_none() {
                    return Err(Error::NotFound("Conversation not found".to_string()));
                }
                let messages = self.store.get_messages(id).await?;
                let start = messages.len().saturating_sub(self.history_window);
                messages[start..].iter().map(|m| m.to_llm()).collect()
            }
            None => Vec::new(),
        };

        let score = self
            .generator
            .score_message(ScoreRequest {
                content: content.to_string(),
                history,
                subject,
            })
            .await;

        tracing::debug!(
            conversation_id = ?conversation_id,
            score = score.score,
            "Scored draft message"
        );
        Ok(score)
    }
}
