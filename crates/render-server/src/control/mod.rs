//! Reverse-client control protocol
//!
//! In reverse mode the server owns one outward connection to its peer. The
//! peer drives it: NEW asks for a data connection, STOP ends the server,
//! PING/PONG keep both sides honest about liveness.

mod connector;
mod liveness;
mod retry;

pub use connector::{ControlConnection, ControlConnector, ControlEvent};
pub use liveness::{Liveness, LivenessCheck};
pub use retry::FixedDelay;
