//! Errors produced while decoding a binary-encoded value tree.

use thiserror::Error;

/// Failures that can occur while parsing a binary-encoded value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream ended before a value was fully decoded.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof {
        /// Byte offset the decoder was at when it ran out of input.
        offset: usize,
    },
    /// A byte that does not correspond to any known opcode was encountered.
    #[error("unknown opcode byte {byte:#x} at offset {offset}")]
    UnknownOpcode {
        /// The offending byte.
        byte: u8,
        /// Byte offset of the offending byte.
        offset: usize,
    },
    /// A `REFERENCE` opcode pointed at an id that has not been assigned yet.
    #[error("reference to unknown id {id}")]
    DanglingReference {
        /// The unresolved id.
        id: u64,
    },
    /// A `REFERENCE` opcode targeted an object type that has no `create`
    /// callback, so it could never have had an id assigned before its
    /// fields were fully decoded.
    #[error("reference into atomic object under construction")]
    ReferenceIntoAtomic,
    /// A registered object type's `create`/`atomic_build` callback declined
    /// to produce a native payload even though it was invoked (a descriptor
    /// bug, not a wire-format error, but one the decoder must still
    /// surface rather than panic on).
    #[error("object type for header produced no native payload")]
    ObjectTypeProducedNoPayload,
    /// An arena mutation failed (e.g. the target was unexpectedly frozen).
    #[error("arena error: {0}")]
    Arena(#[from] plankton_core::ArenaError),
}
