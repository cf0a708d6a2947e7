//! Error types for holyrics-state

use holyrics_client::ClientError;
use thiserror::Error;

/// Result type for holyrics-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors surfaced by the poller and the lifecycle coordinator
///
/// Per-tick transport and parse failures never leave the engine; they are
/// logged and the affected fields go empty for that tick.
#[derive(Debug, Error)]
pub enum StateError {
    /// A command could not be delivered
    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),

    /// A response body was not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// The target is unreachable, rejected the token, or the settings are invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The polling task failed to shut down cleanly
    #[error("Engine error: {0}")]
    Engine(String),
}
