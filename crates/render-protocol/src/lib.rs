//! render-protocol: Wire protocol for render-server
//!
//! Two tiny protocols share this crate. The control protocol runs on the
//! single outward connection in reverse-client mode and exchanges bare
//! 4-byte command words. The stream handshake is the 4-byte flags word every
//! data stream starts with, in both listen and reverse modes.

pub mod codec;
pub mod command;
pub mod error;
pub mod flags;

pub use codec::{ControlCodec, WORD_SIZE};
pub use command::ControlCommand;
pub use error::ProtocolError;
pub use flags::{read_client_flags, write_client_flags, ClientFlags};
