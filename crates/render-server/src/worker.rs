//! Built-in worker
//!
//! The real payload consumer lives outside this crate. `EchoWorker` is what
//! the binary runs by default: it sends every byte back until the client
//! hangs up, which is enough to check a deployment end to end.

use render_core::error::SessionError;
use render_core::traits::{BoxedStream, SessionJob, Worker};
use render_core::SessionId;

/// Echoes each data stream back to its sender
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoWorker;

impl EchoWorker {
    /// Create an echo worker
    pub fn new() -> Self {
        Self
    }
}

impl Worker for EchoWorker {
    fn create(&self, id: SessionId, stream: BoxedStream) -> Result<SessionJob, SessionError> {
        Ok(Box::pin(async move {
            let (mut reader, mut writer) = tokio::io::split(stream);
            match tokio::io::copy(&mut reader, &mut writer).await {
                Ok(bytes) => {
                    tracing::debug!("{} closed after echoing {} bytes", id, bytes);
                    0
                }
                Err(e) => {
                    tracing::warn!("{} I/O error: {}", id, e);
                    1
                }
            }
        }))
    }

    fn finalize(&self) {
        tracing::info!("Echo worker finalized");
    }
}
