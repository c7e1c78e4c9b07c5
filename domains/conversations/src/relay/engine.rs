//! Relay Engine: one user message in, a persisted exchange out

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use aurora_common::{Config, Error, Result};
use aurora_llm::{GenerateRequest, GeneratorError, ResponseGenerator};

use super::turns::TurnLocks;
use crate::domain::entities::{ConversationId, Message, MessageRole, NewMessage};
use crate::realtime::ConnectionRegistry;
use crate::repository::ConversationStore;

/// Counterpart content used when the generator cannot produce a reply
pub const FALLBACK_REPLY: &str =
    "I'm having trouble responding right now. Let's keep talking in a moment.";

#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Upper bound on one generator call
    pub generator_timeout: Duration,
    /// Trailing messages handed to the generator as context
    pub history_window: usize,
    pub fallback_reply: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            generator_timeout: Duration::from_secs(30),
            history_window: 20,
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }
}

impl From<&Config> for RelaySettings {
    fn from(config: &Config) -> Self {
        Self {
            generator_timeout: config.generator_timeout(),
            history_window: config.history_window,
            ..Default::default()
        }
    }
}

/// A completed exchange, user message first
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub user_message: Message,
    pub counterpart_message: Message,
    /// The counterpart content is the fallback reply
    pub used_fallback: bool,
}

impl Turn {
    /// Both messages in delivery order
    pub fn into_messages(self) -> [Message; 2] {
        [self.user_message, self.counterpart_message]
    }
}

/// Drives turns: persist, generate, persist, broadcast.
///
/// Turns for the same conversation run one at a time, so subscribers see
/// exchanges in completion order and never interleaved. Unrelated
/// conversations proceed independently.
pub struct RelayEngine {
    store: Arc<dyn ConversationStore>,
    generator: Arc<dyn ResponseGenerator>,
    registry: Arc<ConnectionRegistry>,
    settings: RelaySettings,
    turns: TurnLocks,
}

impl RelayEngine {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        generator: Arc<dyn ResponseGenerator>,
        registry: Arc<ConnectionRegistry>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            store,
            generator,
            registry,
            settings,
            turns: TurnLocks::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Run one turn for `conversation_id` and return the persisted pair.
    ///
    /// Blank content is rejected before anything is written. An unknown
    /// conversation aborts after the user message is stored. Generator
    /// failures are absorbed into the fallback reply; store failures end
    /// the turn without a broadcast.
    pub async fn submit_message(
        &self,
        conversation_id: ConversationId,
        content: impl Into<String>,
    ) -> Result<Turn> {
        let new_message = NewMessage::user(conversation_id, content.into())?;

        let _turn = self.turns.acquire(conversation_id).await;

        let user_message = self.store.create_message(new_message).await.map_err(|e| {
            error!(conversation_id, stage = "persist_user", error = %e, "Relay turn failed");
            e
        })?;

        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await
            .map_err(|e| {
                error!(conversation_id, stage = "load_conversation", error = %e, "Relay turn failed");
                e
            })?
            .ok_or_else(|| {
                warn!(
                    conversation_id,
                    message_id = user_message.id,
                    "Message stored for unknown conversation, no reply generated"
                );
                Error::NotFound("Conversation not found".to_string())
            })?;

        let history = self.history_before(&user_message).await?;

        let request = GenerateRequest {
            conversation_id,
            content: user_message.content.clone(),
            continuation_token: conversation.continuation_token.clone(),
            history,
        };

        let (reply, continuation_token, used_fallback) = match self.generate(request).await {
            Ok(reply) => (reply.content, reply.continuation_token, false),
            Err(e) => {
                warn!(conversation_id, error = %e, "Response generator failed, using fallback reply");
                (self.settings.fallback_reply.clone(), None, true)
            }
        };

        let counterpart = NewMessage::new(
            conversation_id,
            MessageRole::counterpart_for(&conversation),
            reply,
        )?;
        let counterpart_message = self.store.create_message(counterpart).await.map_err(|e| {
            error!(conversation_id, stage = "persist_counterpart", error = %e, "Relay turn failed");
            e
        })?;

        if conversation.continuation_token.is_none() {
            if let Some(token) = continuation_token {
                match self
                    .store
                    .update_continuation_token(conversation_id, &token)
                    .await
                {
                    Ok(true) => debug!(conversation_id, "Stored continuation token"),
                    Ok(false) => debug!(conversation_id, "Continuation token already set"),
                    Err(e) => {
                        warn!(conversation_id, error = %e, "Failed to store continuation token")
                    }
                }
            }
        }

        let report = self
            .registry
            .broadcast(conversation_id, &[user_message.clone(), counterpart_message.clone()])
            .await;

        info!(
            conversation_id,
            user_message_id = user_message.id,
            counterpart_message_id = counterpart_message.id,
            used_fallback,
            recipients = report.recipients,
            "Relay turn complete"
        );

        Ok(Turn {
            user_message,
            counterpart_message,
            used_fallback,
        })
    }

    /// Bounded generator call; a blank reply counts as malformed output
    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<aurora_llm::GeneratedReply, GeneratorError> {
        let limit = self.settings.generator_timeout;
        let reply = tokio::time::timeout(limit, self.generator.generate_reply(request))
            .await
            .map_err(|_| GeneratorError::Timeout(limit))??;

        if reply.content.trim().is_empty() {
            return Err(GeneratorError::MalformedOutput(
                "blank reply".to_string(),
            ));
        }
        Ok(reply)
    }

    /// Trailing window of messages preceding `message`
    async fn history_before(&self, message: &Message) -> Result<Vec<aurora_llm::LlmMessage>> {
        if self.settings.history_window == 0 {
            return Ok(Vec::new());
        }

        let messages = self
            .store
            .get_messages(message.conversation_id)
            .await
            .map_err(|e| {
                error!(
                    conversation_id = message.conversation_id,
                    stage = "load_history",
                    error = %e,
                    "Relay turn failed"
                );
                e
            })?;

        let earlier: Vec<&Message> = messages.iter().filter(|m| m.id != message.id).collect();
        let start = earlier.len().saturating_sub(self.settings.history_window);
        Ok(earlier[start..].iter().map(|m| m.to_llm()).collect())
    }
}
