//! Route definitions for Conversations domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{analysis, conversations, messages, ws};
use super::middleware::ConversationsState;

/// Create conversation routes
fn conversation_routes() -> Router<ConversationsState> {
    Router::new()
        .route(
            "/api/conversations",
            post(conversations::create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(conversations::get_conversation),
        )
}

/// Create message routes
fn message_routes() -> Router<ConversationsState> {
    Router::new()
        .route(
            "/api/conversations/{conversation_id}/messages",
            get(messages::list_messages),
        )
        .route("/api/messages", post(messages::send_message))
        .route("/api/analyze", post(analysis::analyze_message))
}

/// Create all Conversations domain routes, including the WebSocket endpoint
pub fn routes() -> Router<ConversationsState> {
    Router::new()
        .merge(conversation_routes())
        .merge(message_routes())
        .route("/ws", get(ws::upgrade))
}
