//! Outbound control connection
//!
//! Dials the peer, performs the START exchange and then turns the command
//! words coming back into [`ControlEvent`]s for the supervisor.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tokio_util::codec::Framed;

use render_core::error::ConnectionError;
use render_core::traits::{BoxedStream, Dialer};
use render_protocol::{ControlCodec, ControlCommand, ProtocolError};

use super::liveness::{Liveness, LivenessCheck};

/// What one step of the command loop produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Peer sent NEW: open a data connection on the negotiated port
    OpenData,
    /// Peer sent STOP
    Stop,
    /// A silent window elapsed and a PING went out
    PingSent,
    /// Nothing for the supervisor to do
    Idle,
}

/// Dials the control endpoint and performs the START handshake
pub struct ControlConnector {
    /// Dialer used for the control connection
    dialer: Arc<dyn Dialer>,
    /// Peer host
    host: String,
    /// Control port on the peer
    port: u16,
    /// Liveness timeout handed to each new connection
    ping_timeout: std::time::Duration,
}

impl ControlConnector {
    /// Create a connector for `host:port`
    pub fn new(
        dialer: Arc<dyn Dialer>,
        host: impl Into<String>,
        port: u16,
        ping_timeout: std::time::Duration,
    ) -> Self {
        Self {
            dialer,
            host: host.into(),
            port,
            ping_timeout,
        }
    }

    /// `host:port` of the control endpoint
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open a fresh control connection and negotiate the data port
    pub async fn connect_and_handshake(&self) -> Result<ControlConnection, ConnectionError> {
        tracing::debug!("Dialing control endpoint {}", self.target());
        let stream = self
            .dialer
            .dial(&self.host, self.port)
            .await
            .map_err(|source| ConnectionError::Dial {
                target: self.target(),
                source,
            })?;

        let mut framed = Framed::new(stream, ControlCodec::new());

        framed
            .send(ControlCommand::Start)
            .await
            .map_err(ConnectionError::Handshake)?;

        let word = match framed.next().await {
            Some(Ok(word)) => word,
            Some(Err(e)) => return Err(ConnectionError::Handshake(e)),
            None => {
                return Err(ConnectionError::Handshake(ProtocolError::Truncated {
                    received: 0,
                }))
            }
        };
        let data_port = u16::try_from(word)
            .ok()
            .filter(|port| *port != 0)
            .ok_or(ConnectionError::Handshake(ProtocolError::InvalidPort(word)))?;

        Ok(ControlConnection {
            framed,
            data_port,
            liveness: Liveness::new(self.ping_timeout),
        })
    }
}

/// An established control connection
pub struct ControlConnection {
    /// Framed control stream
    framed: Framed<BoxedStream, ControlCodec>,
    /// Port the peer accepts data connections on
    data_port: u16,
    /// Outstanding PING bookkeeping
    liveness: Liveness,
}

impl ControlConnection {
    /// Port negotiated during START
    pub fn data_port(&self) -> u16 {
        self.data_port
    }

    /// Whether a PING is waiting for its PONG
    pub fn ping_outstanding(&self) -> bool {
        self.liveness.is_outstanding()
    }

    /// Wait up to the ping timeout for the next command and act on it
    ///
    /// Any error means the connection is unusable and must be dropped.
    pub async fn next_event(&mut self) -> Result<ControlEvent, ConnectionError> {
        let received = tokio::time::timeout(self.liveness.timeout(), self.framed.next()).await;

        match received {
            Err(_) => self.on_silence().await,
            Ok(None) => Err(ConnectionError::Closed),
            Ok(Some(Err(e))) => Err(ConnectionError::Receive(e)),
            Ok(Some(Ok(word))) => self.dispatch(ControlCommand::from(word)).await,
        }
    }

    async fn on_silence(&mut self) -> Result<ControlEvent, ConnectionError> {
        let now = Instant::now();
        match self.liveness.check(now) {
            LivenessCheck::SendPing => {
                self.send(ControlCommand::Ping, "PING").await?;
                self.liveness.ping_sent(now);
                tracing::trace!("PING sent");
                Ok(ControlEvent::PingSent)
            }
            LivenessCheck::Waiting => Ok(ControlEvent::Idle),
            LivenessCheck::Dead { waited } => {
                tracing::warn!("PING timed out");
                Err(ConnectionError::PingTimeout { waited })
            }
        }
    }

    async fn dispatch(&mut self, command: ControlCommand) -> Result<ControlEvent, ConnectionError> {
        tracing::debug!("Got control command {}", command);

        match command {
            ControlCommand::New => Ok(ControlEvent::OpenData),
            ControlCommand::Stop => Ok(ControlEvent::Stop),
            ControlCommand::Ping => {
                self.send(ControlCommand::Pong, "PONG").await?;
                Ok(ControlEvent::Idle)
            }
            ControlCommand::Pong => {
                self.liveness.pong_received();
                Ok(ControlEvent::Idle)
            }
            ControlCommand::Start | ControlCommand::Unknown(_) => {
                tracing::warn!("Unknown control command {}", command.as_u32());
                Ok(ControlEvent::Idle)
            }
        }
    }

    async fn send(
        &mut self,
        command: ControlCommand,
        name: &'static str,
    ) -> Result<(), ConnectionError> {
        self.framed
            .send(command)
            .await
            .map_err(|source| ConnectionError::Send {
                command: name,
                source,
            })
    }

    /// Shut the control stream down
    pub async fn close(self) {
        let mut stream = self.framed.into_inner();
        if let Err(e) = stream.shutdown().await {
            tracing::debug!("Control connection shutdown: {}", e);
        }
    }
}
