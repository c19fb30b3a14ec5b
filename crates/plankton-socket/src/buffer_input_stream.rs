//! An input stream that buffers received message bodies and lets callers
//! pull them one at a time, decoding each against a caller-supplied arena.
//!
//! Grounded on `tclib::BufferInputStream` in
//! `examples/original_source/src/c/socket.hh`: `receive_block` queues a raw
//! message body, `pull_message` decodes and returns the oldest one.

use std::collections::VecDeque;

use plankton_core::{Arena, Variant};
use plankton_binary::{BinaryReader, DecodeError};
use tokio::sync::Mutex;

/// Queues raw, framed message bodies addressed to one stream id and decodes
/// them against a caller-supplied arena on demand.
#[derive(Default)]
pub struct BufferInputStream {
    pending: Mutex<VecDeque<Vec<u8>>>,
}

impl BufferInputStream {
    /// Create an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a freshly received message body. Ownership of `message` passes
    /// to this stream until a caller pulls it back out.
    pub async fn receive_block(&self, message: Vec<u8>) {
        self.pending.lock().await.push_back(message);
    }

    /// Decode and return the oldest queued message, if any, allocating the
    /// result into `arena`. Ownership of the queued bytes transfers to this
    /// call and is dropped once decoding completes.
    pub async fn pull_message<'a>(
        &self,
        arena: &'a Arena,
    ) -> Option<Result<Variant<'a>, DecodeError>> {
        let bytes = self.pending.lock().await.pop_front()?;
        Some(BinaryReader::new(arena).parse(&bytes))
    }

    /// Number of messages currently queued and not yet pulled.
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}
