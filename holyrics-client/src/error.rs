//! Error types for the command client

use thiserror::Error;

/// Errors that can occur while talking to the presentation controller
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not complete: connection refused, timeout, or an
    /// unreadable response body
    #[error("Network/HTTP error: {0}")]
    Transport(String),

    /// A command was sent before any connection was configured
    #[error("No connection configured")]
    NotConfigured,

    /// Command names must be non-empty identifiers
    #[error("Invalid command name: {0:?}")]
    InvalidCommand(String),

    /// Connection settings failed validation
    #[error("Invalid connection config: {0}")]
    InvalidConfig(String),
}

/// Type alias for results that can return a ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
