//! TCP transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};

use render_core::traits::{BoxedStream, Dialer, StreamListener};

/// Listens for inbound TCP data streams
pub struct TcpStreamListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpStreamListener {
    /// Bind to `addr`; port 0 picks a free port
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Listening for render streams on tcp://{}", local_addr);

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl StreamListener for TcpStreamListener {
    async fn accept(&mut self) -> std::io::Result<BoxedStream> {
        let (stream, peer_addr) = self.listener.accept().await?;
        tracing::debug!("Accepted stream from {}", peer_addr);
        // A socket that can't take the option is still a usable stream; only
        // accept itself may fail the listener
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
        }
        Ok(Box::new(stream))
    }

    fn address(&self) -> String {
        self.local_addr.to_string()
    }
}

/// Dials TCP connections with an upper bound on connect time
#[derive(Debug, Clone)]
pub struct TcpDialer {
    connect_timeout: Duration,
}

impl TcpDialer {
    /// Create a dialer that gives up after `connect_timeout`
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, host: &str, port: u16) -> std::io::Result<BoxedStream> {
        tracing::debug!("Connecting to {}:{}", host, port);
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect timed out after {:?}", self.connect_timeout),
                )
            })??;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}

/// Open a TCP stream to `addr` (`host:port`)
pub async fn connect_tcp(addr: &str) -> std::io::Result<BoxedStream> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(Box::new(stream))
}
