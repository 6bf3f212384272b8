//! Collaborator traits
//!
//! The supervisor only knows streams through these seams: something that
//! accepts them, something that dials them, and something that consumes them.

mod transport;
mod worker;

pub use transport::{BoxedStream, DataStream, Dialer, StreamListener};
pub use worker::{SessionJob, Worker};
