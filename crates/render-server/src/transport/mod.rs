//! Stream transports
//!
//! Listen modes bind a [`StreamListener`]; reverse mode dials through a
//! [`Dialer`]. Both hand out [`BoxedStream`]s so nothing above this module
//! cares which socket type is underneath.
//!
//! [`Dialer`]: render_core::traits::Dialer
//! [`BoxedStream`]: render_core::traits::BoxedStream

mod local;
mod tcp;

pub use local::{connect_local, LocalStreamListener};
pub use tcp::{connect_tcp, TcpDialer, TcpStreamListener};

use render_core::config::{ServerConfig, ServerMode};
use render_core::traits::StreamListener;
use render_core::ServerError;

/// Bind the listener matching the configured mode
pub async fn bind_listener(config: &ServerConfig) -> Result<Box<dyn StreamListener>, ServerError> {
    match config.mode {
        ServerMode::Listen => {
            let listener = LocalStreamListener::bind(&config.local_name)?;
            Ok(Box::new(listener))
        }
        ServerMode::TcpListen => {
            let listener = TcpStreamListener::bind(&config.bind_address).await?;
            Ok(Box::new(listener))
        }
        ServerMode::TcpReverseClient => Err(ServerError::WrongMode {
            mode: config.mode,
            operation: "listen",
        }),
    }
}
