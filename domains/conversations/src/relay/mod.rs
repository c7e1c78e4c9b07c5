//! Relay Engine and the coaching side-feature

pub mod coach;
pub mod engine;
pub mod turns;

pub use coach::MessageCoach;
pub use engine::{RelayEngine, RelaySettings, Turn, FALLBACK_REPLY};
pub use turns::TurnLocks;
