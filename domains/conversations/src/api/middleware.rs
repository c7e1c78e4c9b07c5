//! Conversations domain state

use std::sync::Arc;

use aurora_llm::ResponseGenerator;

use crate::realtime::{ConnectionRegistry, SessionSettings};
use crate::relay::{MessageCoach, RelayEngine, RelaySettings};
use crate::repository::ConversationStore;

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub store: Arc<dyn ConversationStore>,
    pub engine: Arc<RelayEngine>,
    pub coach: Arc<MessageCoach>,
    pub session: SessionSettings,
}

impl ConversationsState {
    /// Wire the relay around one shared registry
    pub fn new(
        store: Arc<dyn ConversationStore>,
        generator: Arc<dyn ResponseGenerator>,
        relay: RelaySettings,
        session: SessionSettings,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let coach = Arc::new(MessageCoach::new(
            store.clone(),
            generator.clone(),
            relay.history_window,
        ));
        let engine = Arc::new(RelayEngine::new(store.clone(), generator, registry, relay));

        Self {
            store,
            engine,
            coach,
            session,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.engine.registry()
    }
}
