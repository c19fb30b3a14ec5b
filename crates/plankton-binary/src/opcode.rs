//! The binary opcode stream's tag byte values.

/// A single opcode in the binary stream.
///
/// This is the richer tag set described by the format's instruction
/// decoder contract, not the minimal boolean/integer/array-only set the
/// reference codec happens to wire up — strings, blobs, objects and
/// references all get their own opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// `PTON_OPCODE_NULL`
    Null = 0,
    /// Boolean `true`.
    True = 1,
    /// Boolean `false`.
    False = 2,
    /// `PTON_OPCODE_INT64`
    Int64 = 3,
    /// `PTON_OPCODE_ID64`
    Id = 4,
    /// `PTON_OPCODE_DEFAULT_STRING`
    DefaultString = 5,
    /// `PTON_OPCODE_BEGIN_STRING_WITH_ENCODING`
    StringWithEncoding = 6,
    /// A byte blob.
    Blob = 7,
    /// `PTON_OPCODE_BEGIN_ARRAY`
    Array = 8,
    /// `PTON_OPCODE_BEGIN_MAP`
    Map = 9,
    /// `PTON_OPCODE_BEGIN_OBJECT`
    Object = 10,
    /// `PTON_OPCODE_REFERENCE`
    Reference = 11,
}

impl Opcode {
    /// Resolve a raw tag byte to an [`Opcode`], if it is one.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Opcode::Null,
            1 => Opcode::True,
            2 => Opcode::False,
            3 => Opcode::Int64,
            4 => Opcode::Id,
            5 => Opcode::DefaultString,
            6 => Opcode::StringWithEncoding,
            7 => Opcode::Blob,
            8 => Opcode::Array,
            9 => Opcode::Map,
            10 => Opcode::Object,
            11 => Opcode::Reference,
            _ => return None,
        })
    }
}
