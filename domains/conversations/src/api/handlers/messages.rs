//! Message API handlers

use aurora_common::{Error, Result, ValidatedJson};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{ConversationId, Message, MessageId};

/// Request for sending a message over HTTP
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(range(min = 1, message = "A valid conversationId is required"))]
    pub conversation_id: ConversationId,

    /// Message content; blank content is rejected by the relay
    pub content: String,
}

/// Query params for listing messages
#[derive(Debug, Default, Deserialize)]
pub struct ListMessagesQuery {
    /// Only messages with a larger id, for polling clients
    pub after: Option<MessageId>,
}

/// Run a relay turn and return `[user, counterpart]`.
///
/// Live subscribers of the conversation receive the same pair.
pub async fn send_message(
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<[Message; 2]>)> {
    let turn = state
        .engine
        .submit_message(req.conversation_id, req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(turn.into_messages())))
}

/// List messages for a conversation, oldest first
pub async fn list_messages(
    State(state): State<ConversationsState>,
    Path(conversation_id): Path<ConversationId>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<Message>>> {
    state
        .store
        .get_conversation(conversation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

    let mut messages = state.store.get_messages(conversation_id).await?;
    if let Some(after) = query.after {
        messages.retain(|m| m.id > after);
    }

    Ok(Json(messages))
}
