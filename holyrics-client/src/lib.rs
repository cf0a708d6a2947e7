//! HTTP command client for Holyrics-compatible presentation controllers
//!
//! Every command is a `POST http://{host}:{port}/api/{Command}?token={token}`
//! carrying a JSON options body; the response body is returned as raw text.
//! The client reads its target at call time, so replacing the connection
//! applies to the next call without rebuilding the client.

mod command;
mod config;
mod error;

pub use command::Command;
pub use config::{ClientConfig, ConnectionConfig, DEFAULT_PORT};
pub use error::{ClientError, Result};

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

/// Something that can deliver a command to the controller
///
/// Implemented by [`CommandClient`] for real traffic; the poller and the
/// coordinator only depend on this trait.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Send a command with JSON options and return the raw response body
    ///
    /// A returned body does not imply the controller accepted the command:
    /// non-success HTTP statuses still yield their body text.
    async fn send(&self, command: &str, options: &Value) -> Result<String>;

    /// Send one of the well-known commands
    async fn execute(&self, command: Command) -> Result<String> {
        self.send(command.name(), &command.options()).await
    }
}

/// Command client backed by a shared `reqwest` agent
#[derive(Debug, Clone)]
pub struct CommandClient {
    http: reqwest::Client,
    target: Arc<RwLock<Option<ConnectionConfig>>>,
}

impl CommandClient {
    /// Create a client with default timeouts and no target yet
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            target: Arc::new(RwLock::new(None)),
        })
    }

    /// Replace the connection used by subsequent calls
    pub fn set_target(&self, connection: ConnectionConfig) {
        *self.target.write() = Some(connection);
    }

    /// The connection the next call will use
    pub fn target(&self) -> Option<ConnectionConfig> {
        self.target.read().clone()
    }
}

#[async_trait]
impl CommandTransport for CommandClient {
    async fn send(&self, command: &str, options: &Value) -> Result<String> {
        if !command::is_valid_name(command) {
            return Err(ClientError::InvalidCommand(command.to_string()));
        }

        // Snapshot the target so a concurrent reconfiguration can't mix hosts
        let connection = self.target().ok_or(ClientError::NotConfigured)?;
        let url = connection.command_url(command);
        debug!(command, options = %options, url = %url, "Sending command");

        let response = self
            .http
            .post(&url)
            .query(&[("token", connection.token.as_str())])
            .json(options)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(command, %status, "Controller returned non-success status");
        }

        response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
