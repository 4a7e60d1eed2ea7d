//! Error types for the points SDK

use thiserror::Error;

/// Custom error type for points SDK operations
///
/// `Clone` is derived so a failed token refresh can fan out to every caller
/// awaiting the same in-flight refresh.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for points SDK operations
pub type Result<T> = std::result::Result<T, Error>;
