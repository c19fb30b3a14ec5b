//! Low-level opcode emitter.
//!
//! `Assembler` only knows how to append opcodes and varints to a byte
//! buffer — it has no notion of a `Variant` tree or of references. The
//! tree walk and reference bookkeeping live in [`crate::writer::BinaryWriter`].

use crate::opcode::Opcode;
use crate::varint::{write_biased_uvarint, zigzag_encode};

/// Appends opcodes to an in-memory byte buffer.
#[derive(Debug, Default)]
pub struct Assembler {
    bytes: Vec<u8>,
}

impl Assembler {
    /// Start a new, empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `PTON_OPCODE_NULL`.
    pub fn emit_null(&mut self) {
        self.bytes.push(Opcode::Null as u8);
    }

    /// Emit a boolean.
    pub fn emit_bool(&mut self, value: bool) {
        self.bytes.push(if value { Opcode::True } else { Opcode::False } as u8);
    }

    /// Emit a signed 64-bit integer.
    pub fn emit_int64(&mut self, value: i64) {
        self.bytes.push(Opcode::Int64 as u8);
        write_biased_uvarint(zigzag_encode(value), &mut self.bytes);
    }

    /// Emit an opaque identifier.
    pub fn emit_id(&mut self, size: u32, value: u64) {
        self.bytes.push(Opcode::Id as u8);
        write_biased_uvarint(u64::from(size), &mut self.bytes);
        write_biased_uvarint(value, &mut self.bytes);
    }

    /// Emit a string with the default encoding.
    pub fn emit_default_string(&mut self, bytes: &[u8]) {
        self.bytes.push(Opcode::DefaultString as u8);
        write_biased_uvarint(bytes.len() as u64, &mut self.bytes);
        self.bytes.extend_from_slice(bytes);
    }

    /// Emit a string tagged with a named, non-default encoding.
    pub fn emit_string_with_encoding(&mut self, encoding_name: &str, bytes: &[u8]) {
        self.bytes.push(Opcode::StringWithEncoding as u8);
        write_biased_uvarint(encoding_name.len() as u64, &mut self.bytes);
        self.bytes.extend_from_slice(encoding_name.as_bytes());
        write_biased_uvarint(bytes.len() as u64, &mut self.bytes);
        self.bytes.extend_from_slice(bytes);
    }

    /// Emit a byte blob.
    pub fn emit_blob(&mut self, bytes: &[u8]) {
        self.bytes.push(Opcode::Blob as u8);
        write_biased_uvarint(bytes.len() as u64, &mut self.bytes);
        self.bytes.extend_from_slice(bytes);
    }

    /// Emit the opening of an array with `length` elements. The caller is
    /// responsible for then emitting exactly `length` values.
    pub fn begin_array(&mut self, length: u64) {
        self.bytes.push(Opcode::Array as u8);
        write_biased_uvarint(length, &mut self.bytes);
    }

    /// Emit the opening of a map with `size` entries. The caller is
    /// responsible for then emitting exactly `size` key/value pairs.
    pub fn begin_map(&mut self, size: u64) {
        self.bytes.push(Opcode::Map as u8);
        write_biased_uvarint(size, &mut self.bytes);
    }

    /// Emit the opening of an object with `field_count` payload entries. The
    /// caller is responsible for then emitting the header value followed by
    /// exactly `field_count` key/value pairs.
    pub fn begin_object(&mut self, field_count: u64) {
        self.bytes.push(Opcode::Object as u8);
        write_biased_uvarint(field_count, &mut self.bytes);
    }

    /// Emit a back-reference to a value previously assigned `id`.
    pub fn emit_reference(&mut self, id: u64) {
        self.bytes.push(Opcode::Reference as u8);
        write_biased_uvarint(id, &mut self.bytes);
    }

    /// Peek at the bytes emitted so far without consuming them.
    #[must_use]
    pub fn peek_code(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the assembler, returning everything emitted.
    #[must_use]
    pub fn flush(self) -> Vec<u8> {
        self.bytes
    }
}
