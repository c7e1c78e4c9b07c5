//! Conversations domain: message store, live connection registry, relay engine

pub mod api;
pub mod domain;
pub mod realtime;
pub mod relay;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{
    Conversation, ConversationId, Message, MessageId, MessageRole, NewConversation, NewMessage,
};
pub use domain::frames::{FrameKind, InboundFrame, Payload};
pub use domain::state::{SessionEvent, SessionState, SessionStateMachine, StateError};

// Re-export repository types
pub use repository::{
    ConversationRepository, ConversationStore, ConversationsRepositories,
    InMemoryConversationStore, MessageRepository,
};

// Re-export realtime and relay types
pub use realtime::{ClientConnection, ConnectionId, ConnectionRegistry, SessionSettings};
pub use relay::{MessageCoach, RelayEngine, RelaySettings, Turn};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
