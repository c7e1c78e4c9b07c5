//! Client Session Handler: one WebSocket from upgrade through disconnect

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn, Instrument};

use aurora_common::Config;

use super::connection::ClientConnection;
use crate::domain::entities::ConversationId;
use crate::domain::frames::{self, InboundFrame, Payload};
use crate::domain::state::{SessionEvent, SessionState, SessionStateMachine};
use crate::relay::RelayEngine;

const MALFORMED_FRAME_MESSAGE: &str = "Failed to process message";
const REBIND_MESSAGE: &str = "This connection is bound to another conversation";

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Interval between server Pings; two silent intervals close the session
    pub ping_interval: Duration,
    /// Outbound frames buffered per connection before it counts as stalled
    pub channel_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            channel_capacity: 256,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            ping_interval: config.ws_ping_interval(),
            channel_capacity: config.ws_channel_capacity,
        }
    }
}

/// Frame protocol for one connection, independent of the transport.
///
/// The first valid frame binds the connection to its conversation. Message
/// frames with content become relay turns on their own task so a slow
/// generator never stalls this connection's reads. Each turn waits for the
/// previous one from the same connection, so messages are stored and
/// broadcast in the order their frames arrived.
pub struct SessionHandler {
    connection: Arc<ClientConnection>,
    engine: Arc<RelayEngine>,
    state: SessionState,
    /// Resolves once the most recently spawned turn has finished
    last_turn: Option<oneshot::Receiver<()>>,
}

impl SessionHandler {
    pub fn new(connection: Arc<ClientConnection>, engine: Arc<RelayEngine>) -> Self {
        Self {
            connection,
            engine,
            state: SessionState::Unbound,
            last_turn: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle one inbound text frame.
    ///
    /// Returns the spawned relay turn, if the frame started one.
    pub async fn handle_text(&mut self, text: &str) -> Option<JoinHandle<()>> {
        if self.state.is_terminal() {
            return None;
        }

        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(connection_id = %self.connection.id, error = %e, "Rejected inbound frame");
                self.reply_error(e.client_message());
                return None;
            }
        };

        match self.state {
            SessionState::Unbound => self.bind(frame.conversation_id).await,
            SessionState::Bound(bound) if bound != frame.conversation_id => {
                warn!(
                    connection_id = %self.connection.id,
                    bound,
                    requested = frame.conversation_id,
                    "Frame for a different conversation ignored"
                );
                self.reply_error(REBIND_MESSAGE);
                return None;
            }
            _ => {}
        }

        let content = frame.relay_content()?.to_string();
        let conversation_id = frame.conversation_id;
        let engine = self.engine.clone();
        let connection = self.connection.clone();
        let (finished, done) = oneshot::channel();
        let previous = self.last_turn.replace(done);

        let turn = async move {
            if let Some(previous) = previous {
                // Err means the earlier turn's task is gone, which also frees the slot
                let _ = previous.await;
            }
            if let Err(e) = engine.submit_message(conversation_id, content).await {
                send_error(&connection, &e.client_message());
            }
            drop(finished);
        };
        Some(tokio::spawn(turn.in_current_span()))
    }

    /// Reject a frame that could not be decoded at all
    pub fn reject_undecodable(&self) {
        warn!(connection_id = %self.connection.id, "Rejected non-UTF-8 frame");
        self.reply_error(MALFORMED_FRAME_MESSAGE);
    }

    /// Leave the registry. Safe to call more than once.
    pub async fn close(&mut self) {
        match SessionStateMachine::transition(self.state, SessionEvent::Close) {
            Ok(next) => self.state = next,
            Err(_) => return,
        }

        if let Some(conversation_id) = self
            .engine
            .registry()
            .deregister(self.connection.id)
            .await
        {
            debug!(connection_id = %self.connection.id, conversation_id, "Session left conversation");
        }
    }

    async fn bind(&mut self, conversation_id: ConversationId) {
        match SessionStateMachine::transition(self.state, SessionEvent::Bind(conversation_id)) {
            Ok(next) => {
                self.state = next;
                self.engine
                    .registry()
                    .register(conversation_id, self.connection.clone())
                    .await;
                info!(connection_id = %self.connection.id, conversation_id, "Session bound");
            }
            Err(e) => warn!(connection_id = %self.connection.id, error = %e, "Bind rejected"),
        }
    }

    fn reply_error(&self, message: &str) {
        send_error(&self.connection, message);
    }
}

fn send_error(connection: &ClientConnection, message: &str) {
    if let Err(e) = connection.send(frames::encode_error(message)) {
        debug!(connection_id = %connection.id, error = %e, "Could not deliver error frame");
    }
}

/// Run a WebSocket session until the client leaves, the transport fails,
/// the heartbeat lapses or the registry evicts the connection.
pub async fn run_session(ws: WebSocket, engine: Arc<RelayEngine>, settings: SessionSettings) {
    let (connection, outbound) = ClientConnection::channel(settings.channel_capacity);
    serve(ws, Arc::new(connection), outbound, engine, settings).await;
}

#[instrument(skip_all, fields(connection_id = %connection.id))]
async fn serve(
    ws: WebSocket,
    connection: Arc<ClientConnection>,
    mut outbound: mpsc::Receiver<Payload>,
    engine: Arc<RelayEngine>,
    settings: SessionSettings,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    info!("Client connected");

    let writer_conn = connection.clone();
    let ping_interval = settings.ping_interval;
    let mut writer = tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval(ping_interval);
            // Skip the immediate first tick
            let _ = ticker.tick().await;

            loop {
                tokio::select! {
                    frame = outbound.recv() => {
                        let Some(payload) = frame else { break };
                        if ws_tx.send(WsMessage::Text(payload.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if writer_conn.idle_for() > ping_interval * 2 {
                            warn!(idle = ?writer_conn.idle_for(), "Client unresponsive, disconnecting");
                            break;
                        }
                        if ws_tx.send(WsMessage::Ping(Vec::new().into())).await.is_err() {
                            break;
                        }
                    }
                    _ = writer_conn.evicted() => {
                        warn!(dropped = writer_conn.drop_count(), "Connection evicted after failed delivery");
                        break;
                    }
                }
            }
            let _ = ws_tx.send(WsMessage::Close(None)).await;
        }
        .in_current_span(),
    );

    let mut handler = SessionHandler::new(connection.clone(), engine);

    loop {
        tokio::select! {
            inbound = ws_rx.next() => {
                let msg = match inbound {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket transport error");
                        break;
                    }
                    None => break,
                };
                connection.mark_seen();

                match msg {
                    WsMessage::Text(text) => {
                        let _ = handler.handle_text(text.as_str()).await;
                    }
                    WsMessage::Binary(data) => match std::str::from_utf8(&data) {
                        Ok(text) => {
                            let _ = handler.handle_text(text).await;
                        }
                        Err(_) => handler.reject_undecodable(),
                    },
                    WsMessage::Close(_) => {
                        debug!("Client sent close frame");
                        break;
                    }
                    WsMessage::Ping(_) | WsMessage::Pong(_) => {}
                }
            }
            _ = &mut writer => break,
        }
    }

    handler.close().await;
    writer.abort();
    info!(age = ?connection.age(), "Client disconnected");
}
