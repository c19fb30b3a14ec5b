//! Single-opcode decoding, independent of any [`plankton_core::Arena`].
//!
//! `decode_next_instruction` reads exactly one opcode from the front of a
//! byte slice and reports how many bytes it consumed, without building a
//! `Variant` tree. This is the primitive an external disassembler walks the
//! stream with, one opcode at a time, without needing an `Arena` to hold
//! intermediate values.

use crate::error::DecodeError;
use crate::opcode::Opcode;
use crate::varint::{read_biased_uvarint, zigzag_decode};

/// The payload carried by a single decoded instruction. Container and
/// object opcodes report only their own immediate field (a declared
/// length), not their children — walking the children is the caller's job,
/// one `decode_next_instruction` call at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionPayload<'a> {
    /// `NULL`, `TRUE`, `FALSE` carry no payload.
    None,
    /// A decoded, zig-zag-unbiased signed integer.
    Integer(i64),
    /// An identifier's declared bit size and value.
    Id {
        /// Bit width.
        size: u32,
        /// Raw value.
        value: u64,
    },
    /// The raw bytes of a `DEFAULT_STRING` or `BLOB` payload.
    Bytes(&'a [u8]),
    /// The encoding tag and raw bytes of a `STRING_WITH_ENCODING` payload.
    StringWithEncoding {
        /// The encoding name's raw bytes.
        encoding: &'a [u8],
        /// The string's raw bytes.
        bytes: &'a [u8],
    },
    /// A declared element/pair/field count (`ARRAY`, `MAP`, `OBJECT`) or a
    /// back-reference offset (`REFERENCE`).
    Length(u64),
}

/// One decoded opcode: its tag, how many bytes it occupied, and its
/// immediate payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    /// The opcode tag.
    pub opcode: Opcode,
    /// Total bytes consumed, tag included.
    pub size_consumed: usize,
    /// The opcode's immediate payload.
    pub payload: InstructionPayload<'a>,
}

/// Decode the single opcode at the front of `bytes`.
pub fn decode_next_instruction(bytes: &[u8]) -> Result<Instruction<'_>, DecodeError> {
    let tag = *bytes.first().ok_or(DecodeError::UnexpectedEof { offset: 0 })?;
    let opcode = Opcode::from_u8(tag).ok_or(DecodeError::UnknownOpcode { byte: tag, offset: 0 })?;
    let mut cursor = 1usize;
    let payload = match opcode {
        Opcode::Null | Opcode::True | Opcode::False => InstructionPayload::None,
        Opcode::Int64 => {
            let zigzag = read_biased_uvarint(bytes, &mut cursor)?;
            InstructionPayload::Integer(zigzag_decode(zigzag))
        }
        Opcode::Id => {
            let size = read_biased_uvarint(bytes, &mut cursor)?;
            let value = read_biased_uvarint(bytes, &mut cursor)?;
            InstructionPayload::Id {
                size: size as u32,
                value,
            }
        }
        Opcode::DefaultString | Opcode::Blob => {
            let len = read_biased_uvarint(bytes, &mut cursor)? as usize;
            let slice = slice_bytes(bytes, &mut cursor, len)?;
            InstructionPayload::Bytes(slice)
        }
        Opcode::StringWithEncoding => {
            let name_len = read_biased_uvarint(bytes, &mut cursor)? as usize;
            let encoding = slice_bytes(bytes, &mut cursor, name_len)?;
            let len = read_biased_uvarint(bytes, &mut cursor)? as usize;
            let value_bytes = slice_bytes(bytes, &mut cursor, len)?;
            InstructionPayload::StringWithEncoding {
                encoding,
                bytes: value_bytes,
            }
        }
        Opcode::Array | Opcode::Map | Opcode::Object | Opcode::Reference => {
            InstructionPayload::Length(read_biased_uvarint(bytes, &mut cursor)?)
        }
    };
    Ok(Instruction {
        opcode,
        size_consumed: cursor,
        payload,
    })
}

fn slice_bytes<'a>(bytes: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8], DecodeError> {
    let start = *cursor;
    let end = start
        .checked_add(len)
        .ok_or(DecodeError::UnexpectedEof { offset: start })?;
    let slice = bytes
        .get(start..end)
        .ok_or(DecodeError::UnexpectedEof { offset: start })?;
    *cursor = end;
    Ok(slice)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_null_with_size_one() {
        let instr = decode_next_instruction(&[Opcode::Null as u8]).unwrap();
        assert_eq!(instr.opcode, Opcode::Null);
        assert_eq!(instr.size_consumed, 1);
        assert_eq!(instr.payload, InstructionPayload::None);
    }

    #[test]
    fn decodes_array_header_without_touching_elements() {
        // ARRAY(2) INT64(1) INT64(2) -- only the ARRAY opcode is decoded.
        let bytes = [Opcode::Array as u8, 2, Opcode::Int64 as u8, 2];
        let instr = decode_next_instruction(&bytes).unwrap();
        assert_eq!(instr.opcode, Opcode::Array);
        assert_eq!(instr.size_consumed, 2);
        assert_eq!(instr.payload, InstructionPayload::Length(2));
    }

    #[test]
    fn decodes_default_string_bytes() {
        let bytes = [Opcode::DefaultString as u8, 2, b'h', b'i'];
        let instr = decode_next_instruction(&bytes).unwrap();
        assert_eq!(instr.payload, InstructionPayload::Bytes(b"hi"));
        assert_eq!(instr.size_consumed, 4);
    }
}
