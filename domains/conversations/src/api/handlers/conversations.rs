//! Conversation API handlers

use aurora_common::{Error, Result, ValidatedJson};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{Conversation, ConversationId, NewConversation};

/// Request for creating a conversation
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// Companion mode; defaults to on
    pub is_ai_companion: Option<bool>,
}

/// Create a new conversation
pub async fn create_conversation(
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<CreateConversationRequest>,
) -> Result<(StatusCode, Json<Conversation>)> {
    let new = NewConversation::new(req.name, req.is_ai_companion)?;
    let created = state.store.create_conversation(new).await?;

    tracing::info!(conversation_id = created.id, "Conversation created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a single conversation by ID
pub async fn get_conversation(
    State(state): State<ConversationsState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<Conversation>> {
    let conversation = state
        .store
        .get_conversation(id)
        .await?
        .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

    Ok(Json(conversation))
}
