//! Client side of the stream handshake
//!
//! Used by the `shutdown` subcommand and by anything that wants to open a
//! data stream to a listening server.

use std::fmt;

use render_core::config::ServerMode;
use render_core::traits::BoxedStream;
use render_core::ServerError;
use render_protocol::{write_client_flags, ClientFlags};

use crate::transport::{connect_local, connect_tcp};

/// Where a listening server can be reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local socket name
    Local(String),
    /// TCP `host:port`
    Tcp(String),
}

impl Endpoint {
    /// Endpoint for the address a server reported when it started listening
    pub fn for_mode(mode: ServerMode, address: impl Into<String>) -> Result<Self, ServerError> {
        match mode {
            ServerMode::Listen => Ok(Endpoint::Local(address.into())),
            ServerMode::TcpListen => Ok(Endpoint::Tcp(address.into())),
            ServerMode::TcpReverseClient => Err(ServerError::WrongMode {
                mode,
                operation: "accept client connections",
            }),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Local(name) => write!(f, "local:{}", name),
            Endpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
        }
    }
}

/// Open a data stream and send `flags`
///
/// The returned stream is positioned right after the flags word, ready for
/// payload.
pub async fn connect(endpoint: &Endpoint, flags: ClientFlags) -> Result<BoxedStream, ServerError> {
    let mut stream = match endpoint {
        Endpoint::Local(name) => connect_local(name).await?,
        Endpoint::Tcp(addr) => connect_tcp(addr).await?,
    };
    write_client_flags(&mut stream, flags).await?;
    tracing::debug!("Connected to {} with flags {:#x}", endpoint, flags.bits());
    Ok(stream)
}

/// Ask a listening server to stop accepting streams and shut down
pub async fn request_shutdown(endpoint: &Endpoint) -> Result<(), ServerError> {
    let stream = connect(endpoint, ClientFlags::EXIT_SERVER).await?;
    drop(stream);
    tracing::info!("Shutdown requested at {}", endpoint);
    Ok(())
}
