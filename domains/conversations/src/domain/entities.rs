//! Domain entities for the Conversations domain
//!
//! Conversations and their append-only message history. Identifiers and
//! timestamps are assigned by the store; the types here only carry them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aurora_common::{Error, Result};
use aurora_llm::LlmMessage;

/// Store-assigned conversation identifier
pub type ConversationId = i64;

/// Store-assigned message identifier
pub type MessageId = i64;

/// Message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The human user
    User,
    /// Generated reply in a companion-mode conversation
    Companion,
    /// Generated reply in a plain assistant conversation
    Assistant,
}

impl MessageRole {
    /// Role of the generated reply for a conversation
    pub fn counterpart_for(conversation: &Conversation) -> Self {
        if conversation.is_ai_companion {
            MessageRole::Companion
        } else {
            MessageRole::Assistant
        }
    }

    pub fn is_generated(&self) -> bool {
        !matches!(self, MessageRole::User)
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Companion => write!(f, "companion"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Maximum conversation name length (varchar(200))
const MAX_NAME_LENGTH: usize = 200;

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub name: String,
    pub is_ai_companion: bool,
    /// Opaque generator context; set at most once and never sent to clients
    #[serde(default, skip_serializing)]
    pub continuation_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a conversation
#[derive(Debug, Clone, PartialEq)]
pub struct NewConversation {
    pub name: String,
    pub is_ai_companion: bool,
}

impl NewConversation {
    /// Validate and build creation input. Companion mode defaults to on.
    pub fn new(name: String, is_ai_companion: Option<bool>) -> Result<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("Name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }

        Ok(Self {
            name,
            is_ai_companion: is_ai_companion.unwrap_or(true),
        })
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// View this message as chat history for the generator
    pub fn to_llm(&self) -> LlmMessage {
        if self.role.is_generated() {
            LlmMessage::assistant(self.content.clone())
        } else {
            LlmMessage::user(self.content.clone())
        }
    }
}

/// Input for appending a message
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
}

impl NewMessage {
    /// Build a message typed by the human user
    pub fn user(conversation_id: ConversationId, content: String) -> Result<Self> {
        Self::new(conversation_id, MessageRole::User, content)
    }

    pub fn new(conversation_id: ConversationId, role: MessageRole, content: String) -> Result<Self> {
        validate_conversation_id(conversation_id)?;
        validate_content(&content)?;

        Ok(Self {
            conversation_id,
            role,
            content,
        })
    }
}

/// Conversation ids are positive serials
pub fn validate_conversation_id(id: ConversationId) -> Result<()> {
    if id < 1 {
        return Err(Error::Validation(
            "A valid conversationId is required".to_string(),
        ));
    }
    Ok(())
}

/// Message content must contain something other than whitespace
pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::Validation(
            "Message content cannot be empty".to_string(),
        ));
    }
    Ok(())
}
