//! Per-stream client flags
//!
//! The first 4 bytes of every data stream are a native-endian flags word.
//! Everything after it belongs to the worker session.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::WORD_SIZE;
use crate::error::ProtocolError;

/// Flags word sent by a client at the start of a data stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClientFlags(u32);

impl ClientFlags {
    /// The client asks the server to stop accepting streams and shut down
    pub const EXIT_SERVER: ClientFlags = ClientFlags(1);

    /// No flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Get the raw bits
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(&self, other: ClientFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the exit-server bit is set
    pub const fn requests_exit(&self) -> bool {
        self.contains(Self::EXIT_SERVER)
    }
}

impl std::ops::BitOr for ClientFlags {
    type Output = ClientFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Read the flags word from the start of a stream
pub async fn read_client_flags<R>(reader: &mut R) -> Result<ClientFlags, ProtocolError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut word = [0u8; WORD_SIZE];
    reader.read_exact(&mut word).await?;
    Ok(ClientFlags(u32::from_ne_bytes(word)))
}

/// Write the flags word to the start of a stream
pub async fn write_client_flags<W>(writer: &mut W, flags: ClientFlags) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer.write_all(&flags.0.to_ne_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
