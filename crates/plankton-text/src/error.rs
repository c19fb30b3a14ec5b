//! Error reporting for the text codec.

use thiserror::Error;

/// The offending byte and its offset, recorded by [`crate::reader::TextReader`]
/// when parsing fails.
///
/// End-of-input mid-token reports offender `b'\0'` at the cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxError {
    /// The byte the reader could not make sense of.
    pub offender: u8,
    /// Its 0-based offset into the input.
    pub offset: usize,
}

/// An owned, `std::error::Error`-implementing wrapper around a [`SyntaxError`],
/// for callers that prefer `Result`-based error propagation over polling
/// [`crate::reader::TextReader::has_failed`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unexpected byte {:#04x} at offset {}", .0.offender, .0.offset)]
pub struct TextError(pub SyntaxError);
