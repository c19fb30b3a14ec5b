//! The bounded, concurrent byte-buffer stream that connects an
//! [`crate::OutputSocket`] to an [`crate::InputSocket`] in-process (§4.4
//! "Connector between sockets", §5 concurrency model).
//!
//! Ported from `tclib::ByteBufferStream`'s semaphore pair plus ring buffer,
//! swapping the original's two `NativeSemaphore`s and a `NativeMutex` for
//! `tokio::sync::Semaphore`/`tokio::sync::Mutex` so any number of tokio
//! tasks can block on reads or writes concurrently.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, Semaphore};

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    is_eof: bool,
    byte: u8,
}

struct Ring {
    buffer: Vec<Entry>,
    read_cursor: usize,
    write_cursor: usize,
}

/// A bounded byte stream with any number of concurrent producers and
/// consumers.
///
/// A writer blocks while the ring is full; a reader blocks while it is
/// empty. Close is signalled by writing a single EOF-flagged entry: once a
/// reader dequeues it, it reports EOF and leaves the entry in place (by
/// releasing the readable permit again instead of advancing past it) so
/// every other concurrent reader also observes EOF, without freeing a
/// writable slot for it.
pub struct ByteBufferStream {
    capacity: usize,
    ring: Mutex<Ring>,
    readable: Semaphore,
    writable: Semaphore,
    closed: AtomicBool,
}

impl ByteBufferStream {
    /// Create a new stream with room for `capacity` unread bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `0` — a zero-capacity ring can never hold the
    /// EOF sentinel `close` needs to write.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ByteBufferStream capacity must be non-zero");
        Self {
            capacity,
            ring: Mutex::new(Ring {
                buffer: vec![Entry::default(); capacity],
                read_cursor: 0,
                write_cursor: 0,
            }),
            readable: Semaphore::new(0),
            writable: Semaphore::new(capacity),
            closed: AtomicBool::new(false),
        }
    }

    async fn write_entry(&self, entry: Entry) {
        let Ok(permit) = self.writable.acquire().await else {
            return;
        };
        permit.forget();
        let mut ring = self.ring.lock().await;
        let idx = ring.write_cursor;
        ring.buffer[idx] = entry;
        ring.write_cursor = (idx + 1) % self.capacity;
        drop(ring);
        self.readable.add_permits(1);
    }

    /// Write every byte in `bytes`, blocking while the ring has no free
    /// slots. Bytes from concurrent writers interleave at byte granularity;
    /// callers that need atomic multi-byte delivery must serialize at a
    /// higher level (the framing layer does this per message).
    pub async fn write(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_entry(Entry { is_eof: false, byte }).await;
        }
    }

    /// Read up to `buf.len()` bytes, blocking while the ring is empty.
    /// Returns the number of bytes actually read; `0` means the stream was
    /// closed and every byte written before the close has already been
    /// delivered to this reader.
    pub async fn read(&self, buf: &mut [u8]) -> usize {
        let mut offset = 0;
        while offset < buf.len() {
            let Ok(permit) = self.readable.acquire().await else {
                break;
            };
            permit.forget();
            let mut ring = self.ring.lock().await;
            let idx = ring.read_cursor;
            let entry = ring.buffer[idx];
            if entry.is_eof {
                drop(ring);
                self.readable.add_permits(1);
                break;
            }
            ring.read_cursor = (idx + 1) % self.capacity;
            drop(ring);
            self.writable.add_permits(1);
            buf[offset] = entry.byte;
            offset += 1;
        }
        offset
    }

    /// Signal end-of-stream. Idempotent: only the first call writes the EOF
    /// sentinel into the ring.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.write_entry(Entry { is_eof: true, byte: 0 }).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn writes_then_reads_in_order() {
        let stream = ByteBufferStream::new(8);
        stream.write(b"hello").await;
        let mut buf = [0u8; 5];
        assert_eq!(stream.read(&mut buf).await, 5);
        assert_eq!(&buf, b"hello");
    }

    #[tokio::test]
    async fn read_blocks_until_write_then_close_yields_eof() {
        let stream = Arc::new(ByteBufferStream::new(4));
        let reader = Arc::clone(&stream);
        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 4];
            let n = reader.read(&mut buf).await;
            (n, buf)
        });
        stream.write(b"ab").await;
        stream.close().await;
        let (n, buf) = handle.await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], b"ab");

        let mut trailing = [0u8; 1];
        assert_eq!(stream.read(&mut trailing).await, 0, "closed stream reports EOF");
    }

    #[tokio::test]
    async fn close_is_idempotent_across_multiple_readers() {
        let stream = Arc::new(ByteBufferStream::new(4));
        stream.close().await;
        stream.close().await;

        let mut first = [0u8; 1];
        let mut second = [0u8; 1];
        assert_eq!(stream.read(&mut first).await, 0);
        assert_eq!(stream.read(&mut second).await, 0, "every reader observes EOF");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn bounded_capacity_blocks_concurrent_writer_until_drained() {
        let stream = Arc::new(ByteBufferStream::new(2));
        stream.write(b"xy").await;

        let writer = Arc::clone(&stream);
        let handle = tokio::spawn(async move {
            writer.write(b"z").await;
        });

        tokio::task::yield_now().await;
        assert!(!handle.is_finished(), "writer should block on a full ring");

        let mut buf = [0u8; 1];
        assert_eq!(stream.read(&mut buf).await, 1);
        handle.await.unwrap();
    }
}
