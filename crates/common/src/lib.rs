//! Shared configuration, error handling and extractors for the Aurora relay
//!
//! - Configuration loaded from the environment (12-factor)
//! - The HTTP-facing error type and its client-safe rendering
//! - Request extractors shared by the domain routers
//! - State machine errors

pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
pub use state::StateError;
