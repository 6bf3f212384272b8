//! Local socket transport
//!
//! Unix domain sockets on Unix, named pipes on Windows, both through the
//! `interprocess` crate. Names are namespaced, so no socket file is left
//! behind on disk.

use async_trait::async_trait;
use interprocess::local_socket::tokio::{prelude::*, Listener, Stream};
use interprocess::local_socket::{GenericNamespaced, ListenerOptions, ToNsName};

use render_core::traits::{BoxedStream, StreamListener};

/// Listens for inbound data streams on a local socket
pub struct LocalStreamListener {
    listener: Listener,
    name: String,
}

impl LocalStreamListener {
    /// Create the local socket `name`
    pub fn bind(name: &str) -> std::io::Result<Self> {
        let ns_name = name.to_ns_name::<GenericNamespaced>()?;
        let listener = ListenerOptions::new().name(ns_name).create_tokio()?;
        tracing::info!("Listening for render streams on local socket '{}'", name);

        Ok(Self {
            listener,
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl StreamListener for LocalStreamListener {
    async fn accept(&mut self) -> std::io::Result<BoxedStream> {
        let stream = self.listener.accept().await?;
        tracing::debug!("Accepted stream on local socket '{}'", self.name);
        Ok(Box::new(stream))
    }

    fn address(&self) -> String {
        self.name.clone()
    }
}

/// Open a stream to the local socket `name`
pub async fn connect_local(name: &str) -> std::io::Result<BoxedStream> {
    let ns_name = name.to_ns_name::<GenericNamespaced>()?;
    let stream = Stream::connect(ns_name).await?;
    Ok(Box::new(stream))
}
