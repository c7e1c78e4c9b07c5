//! HTTP and WebSocket handlers

pub mod analysis;
pub mod conversations;
pub mod messages;
pub mod ws;
