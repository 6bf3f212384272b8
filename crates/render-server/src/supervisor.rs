//! Server supervisor
//!
//! Owns the server's lifecycle: picks up data streams (by accepting them or
//! by asking the reverse peer for them), runs the flags handshake on each,
//! turns them into worker sessions and reaps those sessions. Shutdown either
//! drains every session and finalizes the worker, or, when the peer sends
//! STOP, returns on the spot and leaves running sessions behind.

use std::sync::Arc;

use tokio::sync::mpsc;

use render_core::config::{ServerConfig, ServerMode};
use render_core::error::ConnectionError;
use render_core::traits::{BoxedStream, Dialer, StreamListener, Worker};
use render_core::{ServerError, SessionId};
use render_protocol::read_client_flags;

use crate::control::{ControlConnection, ControlConnector, ControlEvent, FixedDelay};
use crate::session::{Session, SessionRegistry};
use crate::transport::{self, TcpDialer};

/// Capacity of the event channel handed out by [`RenderServer::subscribe`]
///
/// Events are dropped rather than block the supervisor when it is full.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Observable milestones of a running server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Control connection established and START answered
    ControlConnected { data_port: u16 },
    /// Control connection could not be established or was torn down
    ControlLost { reason: String },
    /// A liveness PING went out on the control connection
    PingSent,
    /// A session started; `reaped` finished ones were swept before it was
    /// tracked, leaving `tracked` in the registry
    SessionStarted {
        id: SessionId,
        reaped: usize,
        tracked: usize,
    },
    /// A stream was dropped instead of becoming a session
    SessionRejected { reason: String },
    /// A client asked the server to exit
    ExitRequested,
    /// Every session was joined and the worker finalized
    Drained { joined: usize },
}

/// How [`RenderServer::run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainExit {
    /// Sessions were drained and the worker finalized
    Drained { joined: usize },
    /// The reverse peer sent STOP; sessions were abandoned, nothing finalized
    Stopped,
}

/// Why the acquisition loop ended
enum LoopExit {
    Drain,
    Stop,
}

/// The long-lived server object
pub struct RenderServer {
    /// Configuration, fixed for the server's lifetime
    config: ServerConfig,
    /// Listening endpoint (listen modes only)
    listener: Option<Box<dyn StreamListener>>,
    /// Dialer for control and data connections (reverse mode)
    dialer: Arc<dyn Dialer>,
    /// Consumer of data streams
    worker: Arc<dyn Worker>,
    /// Running sessions
    registry: SessionRegistry,
    /// Set once a client asks the server to exit
    exiting: bool,
    /// Optional event subscriber
    events: Option<mpsc::Sender<ServerEvent>>,
}

impl RenderServer {
    /// Create a server that listens for inbound streams
    ///
    /// Returns the server together with the address clients should use. If
    /// the address is longer than `config.address_capacity` the listener is
    /// closed and an error returned.
    pub async fn listen(
        config: ServerConfig,
        worker: Arc<dyn Worker>,
    ) -> Result<(Self, String), ServerError> {
        if !config.mode.is_listening() {
            return Err(ServerError::WrongMode {
                mode: config.mode,
                operation: "listen",
            });
        }
        config.validate()?;

        let listener = transport::bind_listener(&config).await?;
        let address = listener.address();
        if address.len() > config.address_capacity {
            tracing::error!(
                "Listen address too long for provided capacity: {} > {}",
                address.len(),
                config.address_capacity
            );
            drop(listener);
            return Err(ServerError::AddressTooLong {
                len: address.len(),
                address,
                capacity: config.address_capacity,
            });
        }

        let dialer = Arc::new(TcpDialer::new(config.connect_timeout));
        let server = Self::build(config, Some(listener), dialer, worker);
        Ok((server, address))
    }

    /// Create a server that dials out to its peer
    ///
    /// Nothing is connected yet; [`RenderServer::run`] dials on every
    /// (re)start.
    pub fn reverse(config: ServerConfig, worker: Arc<dyn Worker>) -> Result<Self, ServerError> {
        if config.mode != ServerMode::TcpReverseClient {
            return Err(ServerError::WrongMode {
                mode: config.mode,
                operation: "dial out",
            });
        }
        config.validate()?;

        let dialer = Arc::new(TcpDialer::new(config.connect_timeout));
        Ok(Self::build(config, None, dialer, worker))
    }

    fn build(
        config: ServerConfig,
        listener: Option<Box<dyn StreamListener>>,
        dialer: Arc<dyn Dialer>,
        worker: Arc<dyn Worker>,
    ) -> Self {
        let registry = SessionRegistry::new(config.max_sessions);
        Self {
            config,
            listener,
            dialer,
            worker,
            registry,
            exiting: false,
            events: None,
        }
    }

    /// Replace the dialer used for control and data connections
    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = dialer;
        self
    }

    /// Replace the listener used in the listen modes
    ///
    /// The listener bound by [`RenderServer::listen`] is dropped. Ignored in
    /// reverse mode, which never accepts.
    pub fn with_listener(mut self, listener: Box<dyn StreamListener>) -> Self {
        if self.config.mode.is_listening() {
            self.listener = Some(listener);
        }
        self
    }

    /// Receive [`ServerEvent`]s from now on
    ///
    /// Only one subscriber is kept; subscribing again replaces it.
    pub fn subscribe(&mut self) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.events = Some(tx);
        rx
    }

    /// Stream acquisition mode
    pub fn mode(&self) -> ServerMode {
        self.config.mode
    }

    /// Listening address, if this server listens
    pub fn address(&self) -> Option<String> {
        self.listener.as_ref().map(|l| l.address())
    }

    /// Whether a client has asked the server to exit
    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    /// Run until a client requests exit, the listener fails, or STOP
    pub async fn run(mut self) -> Result<MainExit, ServerError> {
        tracing::info!("Render server running in {} mode", self.config.mode);

        let exit = match self.config.mode {
            ServerMode::Listen | ServerMode::TcpListen => {
                let listener = self.listener.take().ok_or(ServerError::WrongMode {
                    mode: self.config.mode,
                    operation: "accept without a listener",
                })?;
                self.run_listener(listener).await
            }
            ServerMode::TcpReverseClient => self.run_reverse().await,
        };

        match exit {
            LoopExit::Stop => {
                tracing::info!(
                    "Stopped by peer, abandoning {} session(s)",
                    self.registry.len()
                );
                Ok(MainExit::Stopped)
            }
            LoopExit::Drain => {
                let joined = self.registry.drain().await;
                self.worker.finalize();
                tracing::info!("Render server drained {} session(s)", joined);
                self.emit(ServerEvent::Drained { joined });
                Ok(MainExit::Drained { joined })
            }
        }
    }

    async fn run_listener(&mut self, mut listener: Box<dyn StreamListener>) -> LoopExit {
        while !self.exiting {
            let stream = match listener.accept().await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!("Error accepting connection, aborting: {}", e);
                    break;
                }
            };
            self.handle_stream(stream).await;
        }

        self.listener = Some(listener);
        LoopExit::Drain
    }

    async fn run_reverse(&mut self) -> LoopExit {
        let connector = ControlConnector::new(
            Arc::clone(&self.dialer),
            self.config.remote_host(),
            self.config.remote_port,
            self.config.ping_timeout,
        );
        let mut retry = FixedDelay::from_config(&self.config);

        loop {
            match connector.connect_and_handshake().await {
                Ok(mut control) => {
                    tracing::info!("Connected to {}", connector.target());
                    tracing::info!(
                        "Port {} will be used for data connections",
                        control.data_port()
                    );
                    self.emit(ServerEvent::ControlConnected {
                        data_port: control.data_port(),
                    });

                    match self.serve_control(&mut control).await {
                        Ok(exit) => {
                            control.close().await;
                            return exit;
                        }
                        Err(e) => {
                            tracing::warn!("Control connection lost: {}", e);
                            self.emit(ServerEvent::ControlLost {
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.emit(ServerEvent::ControlLost {
                        reason: e.to_string(),
                    });
                }
            }

            retry.wait().await;
        }
    }

    /// Run the command loop until STOP, exit, or a connection failure
    async fn serve_control(
        &mut self,
        control: &mut ControlConnection,
    ) -> Result<LoopExit, ConnectionError> {
        loop {
            match control.next_event().await? {
                ControlEvent::OpenData => {
                    if let Some(stream) = self.open_data_stream(control.data_port()).await {
                        self.handle_stream(stream).await;
                    }
                }
                ControlEvent::Stop => return Ok(LoopExit::Stop),
                ControlEvent::PingSent => self.emit(ServerEvent::PingSent),
                ControlEvent::Idle => {}
            }

            if self.exiting {
                return Ok(LoopExit::Drain);
            }
        }
    }

    async fn open_data_stream(&mut self, port: u16) -> Option<BoxedStream> {
        let host = self.config.remote_host();
        match self.dialer.dial(host, port).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::warn!("Failed to open data connection to {}:{}: {}", host, port, e);
                None
            }
        }
    }

    /// Flags handshake, then start and track a session
    async fn handle_stream(&mut self, mut stream: BoxedStream) {
        let flags = match read_client_flags(&mut stream).await {
            Ok(flags) => flags,
            Err(e) => {
                tracing::warn!("Error reading client flags: {}", e);
                return;
            }
        };

        if flags.requests_exit() {
            tracing::info!("Client requested server exit");
            self.exiting = true;
            self.emit(ServerEvent::ExitRequested);
            return;
        }

        let id = self.registry.allocate_id();
        let started = self
            .registry
            .check_capacity()
            .and_then(|()| Session::spawn(self.worker.as_ref(), id, stream));

        let session = match started {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Failed to start {}: {}", id, e);
                self.emit(ServerEvent::SessionRejected {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let reaped = self.registry.sweep();
        if let Err(session) = self.registry.insert(session) {
            tracing::error!("{} is already tracked", session.id());
            return;
        }

        tracing::debug!("Started {} ({} tracked)", id, self.registry.len());
        self.emit(ServerEvent::SessionStarted {
            id,
            reaped,
            tracked: self.registry.len(),
        });
    }

    fn emit(&self, event: ServerEvent) {
        if let Some(tx) = &self.events {
            if tx.try_send(event).is_err() {
                tracing::trace!("Event subscriber gone or full");
            }
        }
    }
}
