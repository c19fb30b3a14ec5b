//! Error type for the socket framing layer.

use thiserror::Error;

/// Failures that can occur while reading or writing the framed socket
/// protocol.
#[derive(Debug, Error)]
pub enum SocketError {
    /// The 8-byte stream magic did not match [`crate::STREAM_MAGIC`].
    #[error("bad stream magic")]
    BadMagic,
    /// The stream ended before a length-prefixed field could be read in
    /// full.
    #[error("unexpected end of stream")]
    UnexpectedEof,
    /// A control or framing opcode byte did not match any known value.
    #[error("unknown socket opcode {0}")]
    UnknownOpcode(u8),
    /// The binary codec failed to decode a value message's payload.
    #[error("failed to decode value message: {0}")]
    Decode(#[from] plankton_binary::DecodeError),
    /// An I/O error from the underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
