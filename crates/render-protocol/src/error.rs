//! Protocol error types

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The peer closed the stream before a full word arrived
    #[error("Stream closed after {received} of 4 bytes")]
    Truncated { received: usize },

    /// A negotiated port does not fit a TCP port number
    #[error("Invalid data port {0}")]
    InvalidPort(u32),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
