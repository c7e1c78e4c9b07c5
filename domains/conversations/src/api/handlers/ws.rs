//! WebSocket upgrade handler

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};

use crate::api::middleware::ConversationsState;
use crate::realtime::run_session;

/// Upgrade to a WebSocket and hand the socket to a session
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<ConversationsState>) -> Response {
    let engine = state.engine.clone();
    let settings = state.session.clone();
    ws.on_upgrade(move |socket| run_session(socket, engine, settings))
}
