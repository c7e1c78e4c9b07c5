//! Aurora application composition root
//!
//! Picks the store and response generator from configuration and mounts the
//! Conversations domain router behind the shared HTTP middleware.

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use aurora_common::Config;
use aurora_conversations::{
    ConversationStore, ConversationsRepositories, ConversationsState, InMemoryConversationStore,
    RelaySettings, SessionSettings,
};
use aurora_llm::{LlmConfig, LlmResponseGenerator, LlmService, LlmServiceFactory};
use sqlx::PgPool;

/// Create the main application router with all routes and middleware
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    let store = create_store(config).await?;

    let llm: Arc<dyn LlmService> = Arc::from(LlmServiceFactory::create(LlmConfig::from(config))?);
    info!(provider = %config.llm_provider, model = %llm.default_model(), "Response generator ready");
    let generator = Arc::new(LlmResponseGenerator::new(llm));

    let state = ConversationsState::new(
        store,
        generator,
        RelaySettings::from(config),
        SessionSettings::from(config),
    );

    Ok(router(state, &config.cors_origin))
}

/// Mount the domain routes and shared middleware on prepared state
pub fn router(state: ConversationsState, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(aurora_conversations::routes().with_state(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origin))
                .into_inner(),
        )
}

/// Postgres when `DATABASE_URL` is set, otherwise a volatile in-memory store
async fn create_store(config: &Config) -> Result<Arc<dyn ConversationStore>, anyhow::Error> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
        return Ok(Arc::new(InMemoryConversationStore::new()));
    };

    let pool = PgPool::connect(url)
        .await
        .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
    info!("Database connection established");

    let repos = ConversationsRepositories::new(pool);
    repos.migrate().await?;
    info!("Database migrations applied");

    Ok(Arc::new(repos))
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }

    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(origin, "Invalid CORS_ORIGIN, cross-origin requests will be refused");
            CorsLayer::new()
        }
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
