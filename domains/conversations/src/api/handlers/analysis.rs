//! Draft-message scoring handler

use aurora_common::{Result, ValidatedJson};
use aurora_llm::{MessageScore, SubjectAttributes};
use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::ConversationId;

/// Request for analyzing a draft message
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub message: String,

    /// Score in the context of this conversation's recent history
    #[validate(range(min = 1, message = "A valid conversationId is required"))]
    pub conversation_id: Option<ConversationId>,

    pub subject: Option<SubjectAttributes>,
}

/// Score a draft message; upstream failures yield the neutral score
pub async fn analyze_message(
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<AnalyzeRequest>,
) -> Result<Json<MessageScore>> {
    let score = state
        .coach
        .analyze(&req.message, req.conversation_id, req.subject)
        .await?;

    Ok(Json(score))
}
