//! Response generation for the Aurora relay
//!
//! - [`LlmService`]: a provider-agnostic chat completion call
//! - [`groq::GroqService`]: OpenAI-compatible chat completions (Groq by default)
//! - [`mock::MockLlmService`]: deterministic responses for tests and local runs
//! - [`generator::ResponseGenerator`]: companion replies and message scoring,
//!   the contract the relay engine consumes

pub mod generator;
pub mod groq;
pub mod mock;
pub mod scoring;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use generator::{
    GenerateRequest, GeneratedReply, GeneratorError, LlmResponseGenerator, ResponseGenerator,
};
pub use scoring::{MessageScore, ScoreRequest, ScoreScale, SubjectAttributes};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,

    /// The provider produced output that failed its own format check.
    /// `partial` carries whatever text it managed to generate.
    #[error("LLM produced malformed output: {message}")]
    MalformedOutput {
        message: String,
        partial: Option<String>,
    },
}

/// Chat role understood by the completion API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

/// One turn of chat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// A single completion call
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Model id; empty means the service default
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Ask the provider to constrain output to a JSON object
    pub json_output: bool,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// LLM service configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider (groq, openai, mock)
    pub provider: String,
    pub api_key: String,
    /// Base URL override (OpenAI-compatible endpoints)
    pub base_url: Option<String>,
    pub default_model: String,
    pub max_tokens: u32,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl LlmConfig {
    /// Create LLM config from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let config = aurora_common::Config::from_env()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;
        Ok(Self::from(&config))
    }
}

impl From<&aurora_common::Config> for LlmConfig {
    fn from(config: &aurora_common::Config) -> Self {
        Self {
            provider: config.llm_provider.clone(),
            api_key: config.groq_api_key.clone(),
            base_url: Some(config.llm_base_url.clone()),
            default_model: config.llm_model.clone(),
            max_tokens: config.llm_max_tokens,
            request_timeout: config.generator_timeout(),
        }
    }
}

/// Provider-agnostic completion service
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Run one chat completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> &str;
}

/// LLM service factory
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    /// Create an LLM service based on configuration
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "groq" | "openai" => {
                tracing::info!(
                    provider = %config.provider,
                    model = %config.default_model,
                    "Creating OpenAI-compatible LLM service"
                );
                Ok(Box::new(groq::GroqService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            other => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}",
                other
            ))),
        }
    }
}
