//! Transport traits

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// A bidirectional byte stream a session or the control protocol can own
pub trait DataStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> DataStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// Type-erased stream, whatever transport produced it
pub type BoxedStream = Box<dyn DataStream>;

/// A bound endpoint that hands out inbound streams
#[async_trait]
pub trait StreamListener: Send {
    /// Wait for the next inbound stream
    ///
    /// An error here means the endpoint itself is unusable.
    async fn accept(&mut self) -> std::io::Result<BoxedStream>;

    /// Human-readable address clients can connect to
    fn address(&self) -> String;
}

/// Opens outbound streams to a remote host
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Connect to `host:port`
    async fn dial(&self, host: &str, port: u16) -> std::io::Result<BoxedStream>;
}
