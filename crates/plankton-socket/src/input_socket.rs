//! Reads the framed value-message protocol off an async byte source,
//! demultiplexing `SEND_VALUE` messages onto per-stream-id
//! [`BufferInputStream`]s (§4.4).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace, warn};

use crate::buffer_input_stream::BufferInputStream;
use crate::config::SocketConfig;
use crate::error::SocketError;
use crate::frame;

type StreamFactory = dyn Fn(&[u8]) -> Arc<BufferInputStream> + Send + Sync;

/// Reads the stream header and subsequent opcodes from `R`, routing decoded
/// value messages to the addressed stream.
///
/// Mirrors `plankton::InputSocket` in
/// `examples/original_source/src/c/socket.hh`: stream ids are opaque byte
/// keys (here just `Vec<u8>`, which hashes and compares bytewise for free),
/// a pluggable factory creates a [`BufferInputStream`] the first time an
/// unknown stream id is addressed, and a distinguished root stream id is
/// pre-bound at construction.
pub struct InputSocket<R> {
    src: R,
    cursor: usize,
    config: SocketConfig,
    root: Arc<BufferInputStream>,
    streams: HashMap<Vec<u8>, Arc<BufferInputStream>>,
    default_factory: Box<StreamFactory>,
}

impl<R: AsyncRead + Unpin> InputSocket<R> {
    /// Wrap `src`, pre-binding the root stream id.
    #[must_use]
    pub fn new(src: R) -> Self {
        Self {
            src,
            cursor: 0,
            config: SocketConfig::default(),
            root: Arc::new(BufferInputStream::new()),
            streams: HashMap::new(),
            default_factory: Box::new(|_id| Arc::new(BufferInputStream::new())),
        }
    }

    /// Replace the factory used to create a stream the first time an
    /// unrecognized, non-root stream id is addressed.
    #[must_use]
    pub fn with_default_factory(
        mut self,
        factory: impl Fn(&[u8]) -> Arc<BufferInputStream> + Send + Sync + 'static,
    ) -> Self {
        self.default_factory = Box::new(factory);
        self
    }

    fn map_eof(err: std::io::Error) -> SocketError {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            SocketError::UnexpectedEof
        } else {
            SocketError::Io(err)
        }
    }

    async fn read_required_byte(&mut self) -> Result<u8, SocketError> {
        let mut buf = [0u8; 1];
        self.src.read_exact(&mut buf).await.map_err(Self::map_eof)?;
        self.cursor += 1;
        Ok(buf[0])
    }

    async fn read_uvarint(&mut self) -> Result<u64, SocketError> {
        let mut next = self.read_required_byte().await?;
        let mut result = u64::from(next & 0x7F);
        let mut offset = 7u32;
        while next >= 0x80 {
            next = self.read_required_byte().await?;
            let payload = u64::from(next & 0x7F) + 1;
            result += payload << offset;
            offset += 7;
        }
        Ok(result)
    }

    async fn read_blob(&mut self, len: usize) -> Result<Vec<u8>, SocketError> {
        let mut buf = vec![0u8; len];
        self.src.read_exact(&mut buf).await.map_err(Self::map_eof)?;
        self.cursor += len;
        Ok(buf)
    }

    async fn read_padding(&mut self) -> Result<(), SocketError> {
        let pad = frame::padding_len(self.cursor, self.config.padding_alignment);
        if pad > 0 {
            self.read_blob(pad).await?;
        }
        Ok(())
    }

    /// Read and validate the stream header: magic, zero pad, the
    /// `SET_DEFAULT_STRING_ENCODING` control opcode, and the trailing
    /// alignment pad. Returns [`SocketError::BadMagic`] if the first 8 bytes
    /// don't match [`frame::STREAM_MAGIC`].
    pub async fn init(&mut self) -> Result<(), SocketError> {
        let mut magic = [0u8; 8];
        self.src.read_exact(&mut magic).await.map_err(Self::map_eof)?;
        self.cursor += 8;
        if &magic != frame::STREAM_MAGIC {
            return Err(SocketError::BadMagic);
        }
        self.read_blob(4).await?;
        let opcode = self.read_required_byte().await?;
        if opcode != frame::SET_DEFAULT_STRING_ENCODING {
            return Err(SocketError::UnknownOpcode(opcode));
        }
        let charset = self.read_uvarint().await?;
        self.config.default_string_encoding = charset as u32;
        self.read_padding().await?;
        debug!(charset, "stream header validated");
        Ok(())
    }

    /// Read and process one opcode: either a control opcode that updates
    /// this socket's own state, or a `SEND_VALUE` message that gets queued
    /// on the addressed stream. Returns `Ok(false)` at a clean end of input
    /// (no bytes available before the next opcode byte) rather than an
    /// error.
    pub async fn process_next_instruction(&mut self) -> Result<bool, SocketError> {
        let mut opcode_buf = [0u8; 1];
        if self.src.read(&mut opcode_buf).await? == 0 {
            return Ok(false);
        }
        self.cursor += 1;
        match opcode_buf[0] {
            frame::SET_DEFAULT_STRING_ENCODING => {
                let charset = self.read_uvarint().await?;
                self.config.default_string_encoding = charset as u32;
            }
            frame::SEND_VALUE => {
                let id_len = self.read_uvarint().await? as usize;
                let stream_id = self.read_blob(id_len).await?;
                let msg_len = self.read_uvarint().await? as usize;
                let payload = self.read_blob(msg_len).await?;
                self.read_padding().await?;
                trace!(stream_id = ?stream_id, len = payload.len(), "queuing value message");
                let stream = self.get_stream(&stream_id);
                stream.receive_block(payload).await;
            }
            other => {
                warn!(opcode = other, "unknown socket opcode");
                return Err(SocketError::UnknownOpcode(other));
            }
        }
        Ok(true)
    }

    fn get_stream(&mut self, id: &[u8]) -> Arc<BufferInputStream> {
        if id == frame::ROOT_STREAM_ID {
            return Arc::clone(&self.root);
        }
        if let Some(stream) = self.streams.get(id) {
            return Arc::clone(stream);
        }
        let stream = (self.default_factory)(id);
        self.streams.insert(id.to_vec(), Arc::clone(&stream));
        stream
    }

    /// The pre-bound root stream.
    #[must_use]
    pub fn root_stream(&self) -> Arc<BufferInputStream> {
        Arc::clone(&self.root)
    }

    /// The stream bound to `id`, if one has been created (by `id` being
    /// addressed, or by being the root stream id). Does not create one.
    #[must_use]
    pub fn stream(&self, id: &[u8]) -> Option<Arc<BufferInputStream>> {
        if id == frame::ROOT_STREAM_ID {
            Some(Arc::clone(&self.root))
        } else {
            self.streams.get(id).map(Arc::clone)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::output_socket::OutputSocket;
    use plankton_core::{Arena, Variant};

    #[tokio::test]
    async fn round_trips_a_value_on_the_root_stream() {
        let mut writer = OutputSocket::new(Vec::new(), SocketConfig::default());
        writer.init().await.unwrap();
        writer
            .send_value(Variant::Integer(42), frame::ROOT_STREAM_ID)
            .await
            .unwrap();
        let bytes = writer.into_inner();

        let mut reader = InputSocket::new(bytes.as_slice());
        reader.init().await.unwrap();
        assert!(reader.process_next_instruction().await.unwrap());

        let arena = Arena::new();
        let root = reader.root_stream();
        let value = root.pull_message(&arena).await.unwrap().unwrap();
        assert_eq!(value.as_integer(), Some(42));
    }

    #[tokio::test]
    async fn routes_to_distinct_stream_ids() {
        let mut writer = OutputSocket::new(Vec::new(), SocketConfig::default());
        writer.init().await.unwrap();
        writer.send_value(Variant::Integer(1), b"a").await.unwrap();
        writer.send_value(Variant::Integer(2), b"b").await.unwrap();
        let bytes = writer.into_inner();

        let mut reader = InputSocket::new(bytes.as_slice());
        reader.init().await.unwrap();
        assert!(reader.process_next_instruction().await.unwrap());
        assert!(reader.process_next_instruction().await.unwrap());
        assert!(!reader.process_next_instruction().await.unwrap(), "clean EOF at end of stream");

        let arena = Arena::new();
        let stream_a = reader.stream(b"a").expect("stream a was addressed");
        let stream_b = reader.stream(b"b").expect("stream b was addressed");
        assert_eq!(
            stream_a.pull_message(&arena).await.unwrap().unwrap().as_integer(),
            Some(1)
        );
        assert_eq!(
            stream_b.pull_message(&arena).await.unwrap().unwrap().as_integer(),
            Some(2)
        );
    }

    #[tokio::test]
    async fn bad_magic_is_rejected() {
        let mut reader = InputSocket::new(&b"NOTPLANK"[..]);
        assert!(matches!(reader.init().await, Err(SocketError::BadMagic)));
    }
}
