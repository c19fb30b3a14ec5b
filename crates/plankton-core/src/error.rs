//! Error types for arena and sink operations.

use thiserror::Error;

/// Failures that can occur while allocating or mutating arena-owned values.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// A mutation was attempted on a value that has already been frozen.
    #[error("cannot mutate a frozen value")]
    Frozen,
    /// An index passed to an arena accessor did not refer to a live slot.
    #[error("invalid arena handle")]
    InvalidHandle,
    /// A requested byte offset was outside the bounds of the target buffer.
    #[error("offset {offset} out of bounds for length {len}")]
    OutOfBounds {
        /// Offset that was requested.
        offset: usize,
        /// Length of the buffer the offset was checked against.
        len: usize,
    },
}
