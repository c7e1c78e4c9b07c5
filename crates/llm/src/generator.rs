//! Response generator contract and its LLM-backed implementation

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::scoring::{self, MessageScore, ScoreRequest, ScoreScale};
use crate::{CompletionRequest, LlmError, LlmMessage, LlmService};

const COMPANION_PROMPT: &str = "You are Aurora, a warm and curious companion chatting with a \
young person. Reply in a friendly, conversational tone, keep answers to a few sentences, and \
encourage kindness and real-world connection.";

/// Input for one counterpart reply
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub conversation_id: i64,
    pub content: String,
    /// Token returned by an earlier turn of this conversation
    pub continuation_token: Option<String>,
    /// Messages preceding `content`, oldest first
    pub history: Vec<LlmMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReply {
    pub content: String,
    pub continuation_token: Option<String>,
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("upstream failure: {0}")]
    Upstream(#[from] LlmError),

    #[error("malformed generator output: {0}")]
    MalformedOutput(String),

    #[error("generator timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces counterpart messages and scores drafts.
///
/// `score_message` never fails: implementations degrade to
/// [`MessageScore::fallback`] instead.
#[async_trait::async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate_reply(&self, request: GenerateRequest)
        -> Result<GeneratedReply, GeneratorError>;

    async fn score_message(&self, request: ScoreRequest) -> MessageScore;
}

/// [`ResponseGenerator`] on top of any chat completion service
pub struct LlmResponseGenerator {
    llm: Arc<dyn LlmService>,
    scale: ScoreScale,
}

impl LlmResponseGenerator {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            scale: ScoreScale::default(),
        }
    }

    pub fn with_scale(mut self, scale: ScoreScale) -> Self {
        self.scale = scale;
        self
    }
}

#[async_trait::async_trait]
impl ResponseGenerator for LlmResponseGenerator {
    async fn generate_reply(
        &self,
        request: GenerateRequest,
    ) -> Result<GeneratedReply, GeneratorError> {
        let mut messages = request.history;
        messages.push(LlmMessage::user(request.content));

        let completion = self
            .llm
            .complete(CompletionRequest {
                system_prompt: Some(COMPANION_PROMPT.to_string()),
                messages,
                temperature: Some(0.8),
                ..Default::default()
            })
            .await?;

        let content = completion.content.trim();
        if content.is_empty() {
            return Err(GeneratorError::MalformedOutput(
                "empty completion".to_string(),
            ));
        }

        tracing::debug!(
            conversation_id = request.conversation_id,
            model = %completion.model,
            output_tokens = completion.output_tokens,
            "Generated companion reply"
        );

        let continuation_token = request
            .continuation_token
            .unwrap_or_else(|| format!("ctx_{}", Uuid::new_v4().simple()));

        Ok(GeneratedReply {
            content: content.to_string(),
            continuation_token: Some(continuation_token),
        })
    }

    async fn score_message(&self, request: ScoreRequest) -> MessageScore {
        let completion = scoring::build_completion(&request, &self.scale);

        match self.llm.complete(completion).await {
            Ok(response) => scoring::parse_score(&response.content, &self.scale)
                .or_else(|| scoring::salvage_partial(&response.content, &self.scale))
                .unwrap_or_else(|| {
                    tracing::warn!("Scoring output was not JSON, using neutral score");
                    MessageScore::fallback(&self.scale)
                }),
            Err(LlmError::MalformedOutput {
                message,
                partial: Some(partial),
            }) => {
                tracing::warn!(error = %message, "Scoring output rejected upstream, salvaging");
                scoring::salvage_partial(&partial, &self.scale)
                    .unwrap_or_else(|| MessageScore::fallback(&self.scale))
            }
            Err(e) => {
                tracing::error!(error = %e, "Error calculating connection score");
                MessageScore::fallback(&self.scale)
            }
        }
    }
}
