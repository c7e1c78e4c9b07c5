//! State machine for a client session's lifecycle
//!
//! Session states: Unbound → Bound → Closed, with Unbound → Closed allowed.
//! Closed is terminal and a session binds at most once.

pub use aurora_common::StateError;

use super::entities::ConversationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Connected, no conversation declared yet
    Unbound,
    /// Registered for one conversation's broadcasts
    Bound(ConversationId),
    /// Transport closed or failed
    Closed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Conversation this session receives broadcasts for
    pub fn conversation_id(&self) -> Option<ConversationId> {
        match self {
            Self::Bound(id) => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbound => write!(f, "unbound"),
            Self::Bound(id) => write!(f, "bound({})", id),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// First inbound frame declared a conversation
    Bind(ConversationId),
    /// Transport closed or errored
    Close,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind(id) => write!(f, "bind({})", id),
            Self::Close => write!(f, "close"),
        }
    }
}

pub struct SessionStateMachine;

impl SessionStateMachine {
    /// Attempt a state transition
    pub fn transition(current: SessionState, event: SessionEvent) -> Result<SessionState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        match (current, event) {
            (SessionState::Unbound, SessionEvent::Bind(id)) => Ok(SessionState::Bound(id)),
            (_, SessionEvent::Close) => Ok(SessionState::Closed),
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            }),
        }
    }
}
