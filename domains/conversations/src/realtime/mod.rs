//! Live connections: registry, per-connection queues, WebSocket sessions

pub mod connection;
pub mod registry;
pub mod session;

pub use connection::{ClientConnection, ConnectionId, DeliveryError};
pub use registry::{BroadcastReport, ConnectionRegistry};
pub use session::{run_session, SessionHandler, SessionSettings};
