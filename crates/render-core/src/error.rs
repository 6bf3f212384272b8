//! Core error types for render-server

use render_protocol::ProtocolError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::ServerMode;
use crate::types::SessionId;

/// Top-level error type for the render-server ecosystem
#[derive(Error, Debug)]
pub enum ServerError {
    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The requested operation makes no sense in this mode
    #[error("Cannot {operation} in {mode} mode")]
    WrongMode {
        mode: ServerMode,
        operation: &'static str,
    },

    /// The listen address does not fit the caller's capacity
    #[error("Address '{address}' is {len} bytes, capacity is {capacity}")]
    AddressTooLong {
        address: String,
        len: usize,
        capacity: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Control-connection errors
///
/// None of these are fatal to the server in reverse-client mode: the
/// connection is torn down and dialed again after the retry delay.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Dialing the remote endpoint failed or timed out
    #[error("Failed to connect to {target}: {source}")]
    Dial {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The START exchange did not complete
    #[error("START handshake failed: {0}")]
    Handshake(#[source] ProtocolError),

    /// The peer closed the control connection
    #[error("Control connection closed by peer")]
    Closed,

    /// Writing a command failed
    #[error("Failed to send {command}: {source}")]
    Send {
        command: &'static str,
        #[source]
        source: ProtocolError,
    },

    /// Reading a command failed
    #[error("Failed to read control command: {0}")]
    Receive(#[source] ProtocolError),

    /// A PING went unanswered
    #[error("PING unanswered for {waited:?}")]
    PingTimeout { waited: Duration },
}

/// Session-related errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// The worker could not build a session for the stream
    #[error("Failed to create session: {0}")]
    Create(String),

    /// Too many sessions are running
    #[error("Session limit of {limit} reached")]
    LimitExceeded { limit: u32 },

    /// The worker task panicked or was aborted
    #[error("{0} terminated abnormally")]
    Aborted(SessionId),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}
