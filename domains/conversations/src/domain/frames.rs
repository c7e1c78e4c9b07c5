//! WebSocket frame shapes
//!
//! Client → server: `{"type": "message" | "typing", "conversationId": 1, "content": "..."}`.
//! Server → client: a JSON array of messages, or `{"error": "..."}`.
//! One JSON document per WebSocket frame.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{ConversationId, Message};

/// Serialized outbound frame, shared across every recipient of a broadcast
pub type Payload = Arc<str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Message,
    Typing,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid conversation id {0}")]
    InvalidConversation(ConversationId),
}

impl FrameError {
    /// Text for the error frame sent back on the same connection
    pub fn client_message(&self) -> &'static str {
        match self {
            FrameError::Malformed(_) => "Failed to process message",
            FrameError::InvalidConversation(_) => "A valid conversationId is required",
        }
    }
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: InboundFrame = serde_json::from_str(text)?;
        if frame.conversation_id < 1 {
            return Err(FrameError::InvalidConversation(frame.conversation_id));
        }
        Ok(frame)
    }

    /// Content to relay, if this frame is a real message.
    ///
    /// Typing frames and message frames with blank content only bind.
    pub fn relay_content(&self) -> Option<&str> {
        match self.kind {
            FrameKind::Message => self
                .content
                .as_deref()
                .filter(|content| !content.trim().is_empty()),
            FrameKind::Typing => None,
        }
    }
}

/// Serialize a batch of messages as one outbound frame
pub fn encode_messages(messages: &[Message]) -> serde_json::Result<Payload> {
    Ok(Arc::from(serde_json::to_string(messages)?))
}

/// Build an error frame
pub fn encode_error(message: &str) -> Payload {
    Arc::from(serde_json::json!({ "error": message }).to_string())
}
