//! Server configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;

/// How the server obtains its data streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerMode {
    /// Listen on a local endpoint (Unix socket or named pipe)
    Listen,
    /// Listen on a TCP port
    TcpListen,
    /// Dial out to a remote peer and wait for its commands
    TcpReverseClient,
}

impl ServerMode {
    /// Whether this mode owns a listening endpoint
    pub fn is_listening(&self) -> bool {
        !matches!(self, ServerMode::TcpReverseClient)
    }
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerMode::Listen => "listen",
            ServerMode::TcpListen => "tcp-listen",
            ServerMode::TcpReverseClient => "tcp-reverse-client",
        };
        f.write_str(name)
    }
}

impl FromStr for ServerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listen" | "local" => Ok(ServerMode::Listen),
            "tcp-listen" | "tcp" => Ok(ServerMode::TcpListen),
            "tcp-reverse-client" | "reverse" => Ok(ServerMode::TcpReverseClient),
            other => Err(format!(
                "unknown mode '{}', expected listen, tcp-listen or tcp-reverse-client",
                other
            )),
        }
    }
}

/// Configuration for the render server
///
/// Set once before the supervisor starts and read-only afterwards; changing
/// any of it means building a new server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Stream acquisition mode
    pub mode: ServerMode,

    /// Local socket name used in `listen` mode
    pub local_name: String,

    /// TCP address to bind in `tcp-listen` mode (port 0 picks a free port)
    pub bind_address: String,

    /// Peer to dial in `tcp-reverse-client` mode
    pub remote_host: Option<String>,

    /// Control port on the peer
    pub remote_port: u16,

    /// Fixed delay between control connection attempts
    #[serde(with = "duration_secs")]
    pub retry_delay: Duration,

    /// How long the control connection may stay silent before a PING,
    /// and how long a PING may stay unanswered
    #[serde(with = "duration_secs")]
    pub ping_timeout: Duration,

    /// Upper bound on a single dial
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Maximum number of concurrently running sessions
    pub max_sessions: Option<u32>,

    /// Longest listen address the caller accepts, in bytes with no
    /// terminator: an address of exactly this length is accepted
    pub address_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: ServerMode::TcpListen,
            local_name: "render-server".to_string(),
            bind_address: "127.0.0.1:22468".to_string(),
            remote_host: None,
            remote_port: 22468,
            retry_delay: Duration::from_secs(5),
            ping_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(30),
            max_sessions: None,
            address_capacity: 256,
        }
    }
}

impl ServerConfig {
    /// Check the settings the selected mode depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            ServerMode::Listen => {
                if self.local_name.is_empty() {
                    return Err(ConfigError::MissingField("local_name".to_string()));
                }
            }
            ServerMode::TcpListen => {
                if self.bind_address.is_empty() {
                    return Err(ConfigError::MissingField("bind_address".to_string()));
                }
            }
            ServerMode::TcpReverseClient => {
                match self.remote_host.as_deref() {
                    Some(host) if !host.is_empty() => {}
                    _ => return Err(ConfigError::MissingField("remote_host".to_string())),
                }
                if self.remote_port == 0 {
                    return Err(ConfigError::Invalid("remote_port must not be 0".to_string()));
                }
            }
        }

        if self.retry_delay.is_zero() {
            return Err(ConfigError::Invalid("retry_delay must be positive".to_string()));
        }
        if self.ping_timeout.is_zero() {
            return Err(ConfigError::Invalid("ping_timeout must be positive".to_string()));
        }
        if self.max_sessions == Some(0) {
            return Err(ConfigError::Invalid("max_sessions must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Remote host for reverse mode, empty when unset
    pub fn remote_host(&self) -> &str {
        self.remote_host.as_deref().unwrap_or_default()
    }

    /// `host:port` of the control endpoint
    pub fn control_target(&self) -> String {
        format!("{}:{}", self.remote_host(), self.remote_port)
    }
}
