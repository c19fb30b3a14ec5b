//! Writes the framed value-message protocol onto an async byte sink (§4.4).

use plankton_binary::BinaryWriter;
use plankton_core::Variant;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::config::SocketConfig;
use crate::error::SocketError;
use crate::frame;

/// Writes the Plankton stream header and framed value messages onto `W`.
///
/// Mirrors `plankton::OutputSocket` in
/// `examples/original_source/src/c/socket.hh`: a fixed stream header
/// followed by any number of `SEND_VALUE` messages, each padded out to an
/// 8-byte boundary.
pub struct OutputSocket<W> {
    dest: W,
    cursor: usize,
    config: SocketConfig,
}

impl<W: AsyncWrite + Unpin> OutputSocket<W> {
    /// Wrap `dest`, using `config` for the default string encoding and
    /// padding alignment.
    #[must_use]
    pub fn new(dest: W, config: SocketConfig) -> Self {
        Self {
            dest,
            cursor: 0,
            config,
        }
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SocketError> {
        self.dest.write_all(bytes).await?;
        self.cursor += bytes.len();
        Ok(())
    }

    async fn write_byte(&mut self, byte: u8) -> Result<(), SocketError> {
        self.write_bytes(&[byte]).await
    }

    async fn write_uvarint(&mut self, value: u64) -> Result<(), SocketError> {
        let mut buf = Vec::new();
        plankton_binary::varint::write_biased_uvarint(value, &mut buf);
        self.write_bytes(&buf).await
    }

    async fn write_padding(&mut self) -> Result<(), SocketError> {
        let pad = frame::padding_len(self.cursor, self.config.padding_alignment);
        if pad > 0 {
            self.write_bytes(&vec![0u8; pad]).await?;
        }
        Ok(())
    }

    /// Write the stream header: magic, zero pad, the
    /// `SET_DEFAULT_STRING_ENCODING` control opcode, then zero pad again up
    /// to the configured alignment. Must be called exactly once, before any
    /// [`OutputSocket::send_value`] call.
    pub async fn init(&mut self) -> Result<(), SocketError> {
        trace!(charset = self.config.default_string_encoding, "writing stream header");
        self.write_bytes(frame::STREAM_MAGIC).await?;
        self.write_bytes(&[0u8; 4]).await?;
        self.write_byte(frame::SET_DEFAULT_STRING_ENCODING).await?;
        self.write_uvarint(u64::from(self.config.default_string_encoding)).await?;
        self.write_padding().await?;
        Ok(())
    }

    /// Send `value` addressed to `stream_id`: a `SEND_VALUE` opcode, the
    /// length-prefixed stream id, and the length-prefixed binary-encoded
    /// value, padded out to the configured alignment.
    pub async fn send_value(&mut self, value: Variant<'_>, stream_id: &[u8]) -> Result<(), SocketError> {
        trace!(stream_id = ?stream_id, "sending value");
        self.write_byte(frame::SEND_VALUE).await?;
        self.write_uvarint(stream_id.len() as u64).await?;
        self.write_bytes(stream_id).await?;
        let encoded = BinaryWriter::new().write(value);
        self.write_uvarint(encoded.len() as u64).await?;
        self.write_bytes(&encoded).await?;
        self.write_padding().await?;
        Ok(())
    }

    /// Flush the underlying sink.
    pub async fn flush(&mut self) -> Result<(), SocketError> {
        self.dest.flush().await?;
        Ok(())
    }

    /// Consume the socket, returning the wrapped sink.
    pub fn into_inner(self) -> W {
        self.dest
    }
}
