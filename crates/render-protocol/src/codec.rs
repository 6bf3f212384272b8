//! Tokio codec for control words
//!
//! The control protocol has no framing beyond the word itself: each message
//! is exactly [`WORD_SIZE`] bytes in host byte order. Decoding yields the raw
//! word because the reply to `START` is a port number, not a command.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::command::ControlCommand;
use crate::error::ProtocolError;

/// Size of every control word and of the stream flags word
pub const WORD_SIZE: usize = 4;

/// Codec for the reverse-client control connection
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlCodec;

impl ControlCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ControlCodec {
    type Item = u32;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < WORD_SIZE {
            return Ok(None);
        }

        let bytes = src.split_to(WORD_SIZE);
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(&bytes);
        Ok(Some(u32::from_ne_bytes(word)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(word) => Ok(Some(word)),
            None if src.is_empty() => Ok(None),
            None => Err(ProtocolError::Truncated {
                received: src.len(),
            }),
        }
    }
}

impl Encoder<ControlCommand> for ControlCodec {
    type Error = ProtocolError;

    fn encode(&mut self, cmd: ControlCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        tracing::trace!("Encoding control command {}", cmd);
        dst.reserve(WORD_SIZE);
        dst.put_slice(&cmd.as_u32().to_ne_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_start_is_native_endian() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(ControlCommand::Start, &mut buf).unwrap();

        assert_eq!(&buf[..], &1001u32.to_ne_bytes());
    }

    #[test]
    fn test_decode_waits_for_full_word() {
        let mut codec = ControlCodec::new();
        let word = 5556u32.to_ne_bytes();

        let mut buf = BytesMut::from(&word[..3]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&word[3..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(5556));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_back_to_back_words() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&ControlCommand::PING.to_ne_bytes());
        buf.extend_from_slice(&ControlCommand::NEW.to_ne_bytes());

        let first = codec.decode(&mut buf).unwrap().map(ControlCommand::from);
        let second = codec.decode(&mut buf).unwrap().map(ControlCommand::from);

        assert_eq!(first, Some(ControlCommand::Ping));
        assert_eq!(second, Some(ControlCommand::New));
    }

    #[test]
    fn test_decode_eof_with_partial_word() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::from(&[1u8, 2][..]);

        let result = codec.decode_eof(&mut buf);
        assert!(matches!(result, Err(ProtocolError::Truncated { received: 2 })));
    }

    #[test]
    fn test_decode_eof_clean() {
        let mut codec = ControlCodec::new();
        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }
}
