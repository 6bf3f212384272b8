//! render-server: connection acceptance and session supervision
//!
//! The server either listens for inbound data streams (local socket or TCP)
//! or, when it cannot be dialed into, keeps one control connection open to a
//! known peer and opens data streams back to it on request. Every data
//! stream is handed to a worker session; the supervisor tracks those
//! sessions, reaps the finished ones and drains the rest on shutdown.

pub mod client;
pub mod control;
pub mod session;
pub mod supervisor;
pub mod transport;
pub mod worker;

pub use supervisor::{MainExit, RenderServer, ServerEvent};
pub use worker::EchoWorker;
