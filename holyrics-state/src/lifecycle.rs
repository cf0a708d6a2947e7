//! Lifecycle coordinator: applies connection changes and owns the poller
//!
//! Every configuration update re-targets the command client, reloads the
//! Bible version list, and restarts polling. Polling only starts once the
//! version list has loaded from the new target.

use std::sync::Arc;

use holyrics_client::{Command, CommandClient, CommandTransport, ConnectionConfig};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::consumer::StateConsumer;
use crate::engine::{EngineState, PollingEngine};
use crate::error::{Result, StateError};
use crate::extract::parse_envelope;
use crate::snapshot::StateSnapshot;

/// Connection status as shown by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceStatus {
    /// No configuration applied yet, or the instance was destroyed
    Disconnected,
    Connecting,
    Ok,
    BadConfig(String),
    ConnectionFailure(String),
}

/// One entry of the Bible version choice list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibleVersion {
    pub id: String,
    pub label: String,
}

impl BibleVersion {
    /// Read the `GetBibleVersions` data array; entries without a `key` are skipped
    fn list_from_data(data: &Value) -> Result<Vec<Self>> {
        let entries = data.as_array().ok_or_else(|| {
            StateError::Configuration("GetBibleVersions returned no version list".to_string())
        })?;

        let versions = entries
            .iter()
            .filter_map(|entry| {
                let Some(id) = entry.get("key").and_then(Value::as_str) else {
                    debug!(entry = %entry, "Skipping Bible version without key");
                    return None;
                };
                let label = entry
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or(id)
                    .to_string();

                Some(BibleVersion {
                    id: id.to_string(),
                    label,
                })
            })
            .collect();

        Ok(versions)
    }
}

/// Connects configuration changes to the command client and the poller
pub struct Coordinator {
    client: CommandClient,
    engine: PollingEngine,
    config: EngineConfig,
    connection: RwLock<Option<ConnectionConfig>>,
    bible_versions: RwLock<Vec<BibleVersion>>,
    status: RwLock<InstanceStatus>,
    /// Serialises configuration updates
    update_lock: tokio::sync::Mutex<()>,
}

impl Coordinator {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let client = CommandClient::with_config(config.client_config())?;
        Ok(Self::with_client(client, config))
    }

    /// Build around an existing client; the poller shares its target
    pub fn with_client(client: CommandClient, config: EngineConfig) -> Self {
        let engine = PollingEngine::new(Arc::new(client.clone()));

        Self {
            client,
            engine,
            config,
            connection: RwLock::new(None),
            bible_versions: RwLock::new(Vec::new()),
            status: RwLock::new(InstanceStatus::Disconnected),
            update_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Apply a new connection, reload the version list and (re)start polling
    ///
    /// Safe to call while polling is running. On failure the poller is left
    /// stopped and the version list is cleared.
    pub async fn configure(&self, connection: ConnectionConfig) -> Result<()> {
        let _guard = self.update_lock.lock().await;

        if let Err(e) = connection.validate() {
            error!(error = %e, "Rejected connection config");
            self.engine.stop().await?;
            self.bible_versions.write().clear();
            self.set_status(InstanceStatus::BadConfig(e.to_string()));
            return Err(StateError::Configuration(e.to_string()));
        }

        info!(host = %connection.host, port = connection.port, "Applying connection config");
        self.client.set_target(connection.clone());
        *self.connection.write() = Some(connection);
        self.set_status(InstanceStatus::Connecting);

        let versions = match self.fetch_bible_versions().await {
            Ok(versions) => versions,
            Err(e) => {
                error!(error = %e, "Controller did not answer GetBibleVersions");
                self.engine.stop().await?;
                self.bible_versions.write().clear();
                self.set_status(InstanceStatus::ConnectionFailure(e.to_string()));
                return Err(StateError::Configuration(format!(
                    "Could not load Bible versions: {}",
                    e
                )));
            }
        };

        info!(count = versions.len(), "Loaded Bible versions");
        *self.bible_versions.write() = versions;

        self.engine.start(self.config.poll_interval).await?;
        self.set_status(InstanceStatus::Ok);

        Ok(())
    }

    /// Stop polling; the instance can be configured again afterwards
    pub async fn destroy(&self) -> Result<()> {
        debug!("destroy");
        self.engine.stop().await?;
        self.set_status(InstanceStatus::Disconnected);
        Ok(())
    }

    /// Send an arbitrary command on behalf of a host action
    pub async fn send_command(&self, command: &str, options: &Value) -> Result<String> {
        Ok(self.client.send(command, options).await?)
    }

    async fn fetch_bible_versions(&self) -> Result<Vec<BibleVersion>> {
        let body = self.client.execute(Command::GetBibleVersions).await?;
        let data = parse_envelope(&body)?.data.ok_or_else(|| {
            StateError::Configuration("GetBibleVersions returned no data".to_string())
        })?;

        BibleVersion::list_from_data(&data)
    }

    fn set_status(&self, status: InstanceStatus) {
        {
            let mut current = self.status.write();
            if *current == status {
                return;
            }
            *current = status.clone();
        }

        debug!(status = ?status, "Instance status changed");
        for consumer in self.engine.consumers() {
            consumer.status_changed(&status);
        }
    }

    pub fn add_consumer(&self, consumer: Arc<dyn StateConsumer>) {
        self.engine.add_consumer(consumer);
    }

    pub fn status(&self) -> InstanceStatus {
        self.status.read().clone()
    }

    pub fn connection(&self) -> Option<ConnectionConfig> {
        self.connection.read().clone()
    }

    /// Choices for action schemas, replaced on every configuration update
    pub fn bible_versions(&self) -> Vec<BibleVersion> {
        self.bible_versions.read().clone()
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.engine.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StateSnapshot>> {
        self.engine.subscribe()
    }

    pub fn engine(&self) -> &PollingEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bible_versions_from_data() {
        let data = json!([
            { "key": "en_kjv", "title": "King James Version" },
            { "key": "pt_acf" },
            { "title": "No key" }
        ]);

        let versions = BibleVersion::list_from_data(&data).unwrap();
        assert_eq!(
            versions,
            vec![
                BibleVersion {
                    id: "en_kjv".to_string(),
                    label: "King James Version".to_string()
                },
                BibleVersion {
                    id: "pt_acf".to_string(),
                    label: "pt_acf".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_bible_versions_require_array() {
        let result = BibleVersion::list_from_data(&json!({ "key": "x" }));
        assert!(matches!(result, Err(StateError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_invalid_connection_is_rejected_without_polling() {
        let coordinator = Coordinator::new(EngineConfig::default()).unwrap();

        let result = coordinator
            .configure(ConnectionConfig::new("not-an-ip", 8091, "t"))
            .await;

        assert!(matches!(result, Err(StateError::Configuration(_))));
        assert_eq!(coordinator.engine_state(), EngineState::Stopped);
        assert!(matches!(coordinator.status(), InstanceStatus::BadConfig(_)));
        assert!(coordinator.connection().is_none());
    }

    #[tokio::test]
    async fn test_destroy_before_configure_is_harmless() {
        let coordinator = Coordinator::new(EngineConfig::default()).unwrap();
        coordinator.destroy().await.unwrap();
        assert_eq!(coordinator.status(), InstanceStatus::Disconnected);
    }
}
