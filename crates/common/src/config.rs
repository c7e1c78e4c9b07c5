//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";
const DEFAULT_LLM_MAX_TOKENS: u32 = 150;
const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HISTORY_WINDOW: usize = 20;
const DEFAULT_WS_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_WS_PING_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Postgres connection URL; the in-memory store is used when absent
    pub database_url: Option<String>,

    /// HTTP / WebSocket listener
    pub port: u16,
    pub cors_origin: String,

    /// Response generator backend
    pub llm_provider: String,
    pub groq_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub generator_timeout_secs: u64,

    /// Trailing messages handed to the generator and the scorer
    pub history_window: usize,

    /// Per-connection outbound queue size
    pub ws_channel_capacity: usize,
    pub ws_ping_interval_secs: u64,

    /// Runtime configuration
    pub log_format: String,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: DEFAULT_PORT,
            cors_origin: "*".to_string(),
            llm_provider: "groq".to_string(),
            groq_api_key: String::new(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_max_tokens: DEFAULT_LLM_MAX_TOKENS,
            generator_timeout_secs: DEFAULT_GENERATOR_TIMEOUT_SECS,
            history_window: DEFAULT_HISTORY_WINDOW,
            ws_channel_capacity: DEFAULT_WS_CHANNEL_CAPACITY,
            ws_ping_interval_secs: DEFAULT_WS_PING_INTERVAL_SECS,
            log_format: "pretty".to_string(),
            rust_log: "aurora=info,tower_http=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Self::default();

        let llm_provider = env::var("LLM_PROVIDER").unwrap_or(defaults.llm_provider);
        let groq_api_key = env::var("GROQ_API_KEY").unwrap_or_default();
        if llm_provider != "mock" && groq_api_key.is_empty() {
            return Err(anyhow::anyhow!(
                "GROQ_API_KEY is required unless LLM_PROVIDER=mock"
            ));
        }

        let config = Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),

            port: parse_or("PORT", defaults.port),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),

            llm_provider,
            groq_api_key,
            llm_base_url: env::var("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_model: env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_max_tokens: parse_or("LLM_MAX_TOKENS", defaults.llm_max_tokens),
            generator_timeout_secs: parse_or(
                "GENERATOR_TIMEOUT_SECS",
                defaults.generator_timeout_secs,
            ),

            history_window: parse_or("HISTORY_WINDOW", defaults.history_window),

            ws_channel_capacity: parse_or("WS_CHANNEL_CAPACITY", defaults.ws_channel_capacity)
                .max(1),
            ws_ping_interval_secs: parse_or(
                "WS_PING_INTERVAL_SECS",
                defaults.ws_ping_interval_secs,
            )
            .max(1),

            log_format: env::var("LOG_FORMAT").unwrap_or(defaults.log_format),
            rust_log: env::var("RUST_LOG").unwrap_or(defaults.rust_log),
        };

        Ok(config)
    }

    /// Upper bound on a single response generator call
    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator_timeout_secs)
    }

    /// Interval between server pings on a WebSocket connection
    pub fn ws_ping_interval(&self) -> Duration {
        Duration::from_secs(self.ws_ping_interval_secs)
    }
}

/// Read and parse an environment variable, falling back on absence or garbage
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
