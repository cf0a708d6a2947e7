//! Connection and HTTP agent settings

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Port the controller's remote API listens on out of the box
pub const DEFAULT_PORT: u16 = 8091;

/// Where the controller lives and how to authenticate against it
///
/// Replaced wholesale on every configuration update. The token is passed
/// verbatim as the `token` query parameter.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub token: String,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token: token.into(),
        }
    }

    /// Validate the settings the way the host's config form does
    ///
    /// The host must be an IP address and the port must be in 1..=65535.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().parse::<IpAddr>().is_err() {
            return Err(ClientError::InvalidConfig(format!(
                "host '{}' is not an IP address",
                self.host
            )));
        }

        if self.port == 0 {
            return Err(ClientError::InvalidConfig(
                "port must be between 1 and 65535".to_string(),
            ));
        }

        Ok(())
    }

    /// `http://host:port`, bracketing IPv6 literals
    pub fn base_url(&self) -> String {
        match self.host.trim().parse::<IpAddr>() {
            Ok(ip) => format!("http://{}", SocketAddr::new(ip, self.port)),
            Err(_) => format!("http://{}:{}", self.host, self.port),
        }
    }

    /// Full URL for a command, without the token query parameter
    pub fn command_url(&self, command: &str) -> String {
        format!("{}/api/{}", self.base_url(), command)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            token: String::new(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// Timeouts for the underlying HTTP agent
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Whole-request timeout including the body
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_connection() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8091);
        assert!(config.token.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_host_and_port() {
        let bad_host = ConnectionConfig::new("holyrics.local", 8091, "abc");
        assert!(matches!(bad_host.validate(), Err(ClientError::InvalidConfig(_))));

        let bad_port = ConnectionConfig::new("10.0.0.5", 0, "abc");
        assert!(matches!(bad_port.validate(), Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_command_url() {
        let config = ConnectionConfig::new("192.168.1.20", 8091, "secret");
        assert_eq!(
            config.command_url("GetAlert"),
            "http://192.168.1.20:8091/api/GetAlert"
        );

        let v6 = ConnectionConfig::new("::1", 9000, "");
        assert_eq!(v6.base_url(), "http://[::1]:9000");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ConnectionConfig::new("10.0.0.5", 8091, "very-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: ConnectionConfig = serde_json::from_str(r#"{"token":"t"}"#).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.token, "t");
    }
}
