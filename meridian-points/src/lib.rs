//! Meridian Points - Operator SDK for the Meridian points service
//!
//! This library provides a client session for the Meridian points-accounting
//! service tied to a blockchain contract: operator-key authentication
//! (challenge-response with an expiry-aware bearer-token cache), point balance
//! queries, transfer batch submission/query/cancellation, and cursor-paginated
//! transfer history traversal.

pub mod error;
pub mod config;
pub mod signer;
pub mod types;
pub mod api;
pub mod auth;
pub mod session;

// Re-export commonly used types for convenience
pub use config::{Network, SessionConfig};
pub use error::{Error, Result};
pub use session::Session;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
