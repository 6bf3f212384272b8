//! Control command words
//!
//! Every command is a single native-endian `u32`. Unknown values are kept
//! as [`ControlCommand::Unknown`] so the receiver can log and skip them
//! instead of dropping the connection.

use std::fmt;

/// A command exchanged on the reverse-client control connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    /// Peer asks the server to open a new data connection
    New,
    /// Peer asks the server to terminate immediately
    Stop,
    /// Server asks the peer to begin; the peer answers with the data port
    Start,
    /// Liveness probe, either direction
    Ping,
    /// Liveness reply, either direction
    Pong,
    /// A word this implementation does not understand
    Unknown(u32),
}

impl ControlCommand {
    /// Wire value of `NEW`
    pub const NEW: u32 = 1;
    /// Wire value of `STOP`
    pub const STOP: u32 = 999;
    /// Wire value of `START`
    pub const START: u32 = 1001;
    /// Wire value of `PING`
    pub const PING: u32 = 1002;
    /// Wire value of `PONG`
    pub const PONG: u32 = 1003;

    /// Decode a command from its wire value
    pub fn from_u32(word: u32) -> Self {
        match word {
            Self::NEW => Self::New,
            Self::STOP => Self::Stop,
            Self::START => Self::Start,
            Self::PING => Self::Ping,
            Self::PONG => Self::Pong,
            other => Self::Unknown(other),
        }
    }

    /// Get the wire value
    pub fn as_u32(&self) -> u32 {
        match self {
            Self::New => Self::NEW,
            Self::Stop => Self::STOP,
            Self::Start => Self::START,
            Self::Ping => Self::PING,
            Self::Pong => Self::PONG,
            Self::Unknown(word) => *word,
        }
    }
}

impl From<u32> for ControlCommand {
    fn from(word: u32) -> Self {
        Self::from_u32(word)
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Stop => write!(f, "STOP"),
            Self::Start => write!(f, "START"),
            Self::Ping => write!(f, "PING"),
            Self::Pong => write!(f, "PONG"),
            Self::Unknown(word) => write!(f, "UNKNOWN({})", word),
        }
    }
}
