//! Walks a [`Variant`] tree into the binary opcode stream, assigning
//! reference offsets to revisited containers, objects, strings and blobs.

use std::collections::HashMap;

use plankton_core::{identity_key, Variant};

use crate::assembler::Assembler;

/// Strings and blobs longer than this many bytes become referenceable.
/// Shorter ones are always re-emitted verbatim: the reference opcode itself
/// costs at least two bytes, so sharing a short string rarely pays for
/// itself.
pub const REFERENCEABLE_LEN_THRESHOLD: usize = 16;

/// Encodes a [`Variant`] tree as a binary opcode stream.
///
/// The reference-offset counter is per [`BinaryWriter::write`] call: each
/// call starts a fresh reference table, independent of any other value
/// written before or after it.
#[derive(Debug, Default)]
pub struct BinaryWriter;

impl BinaryWriter {
    /// Create a new writer. Stateless between calls; kept as a type so the
    /// API reads symmetrically with [`crate::reader::BinaryReader`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Encode `value` as a binary opcode stream.
    pub fn write(&self, value: Variant<'_>) -> Vec<u8> {
        let mut session = WriteSession {
            assembler: Assembler::new(),
            seen: HashMap::new(),
            next_offset: 0,
        };
        session.encode(value);
        session.assembler.flush()
    }
}

struct WriteSession {
    assembler: Assembler,
    seen: HashMap<(usize, u8, usize), u64>,
    next_offset: u64,
}

impl WriteSession {
    fn next_offset(&mut self) -> u64 {
        let offset = self.next_offset;
        self.next_offset += 1;
        offset
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn encode(&mut self, value: Variant<'_>) {
        if let Some(key) = identity_key(&value) {
            if let Some(&offset) = self.seen.get(&key) {
                self.assembler.emit_reference(offset);
                return;
            }
        }

        match value {
            Variant::Null => self.assembler.emit_null(),
            Variant::Bool(b) => self.assembler.emit_bool(b),
            Variant::Integer(i) => self.assembler.emit_int64(i),
            Variant::Id { size, value } => self.assembler.emit_id(size, value),
            Variant::String(s) => {
                if s.len() > REFERENCEABLE_LEN_THRESHOLD {
                    let offset = self.next_offset();
                    self.seen.insert(identity_key(&value).expect("strings are referenceable"), offset);
                }
                match s.encoding() {
                    plankton_core::Encoding::Utf8 => {
                        s.with_bytes(|b| self.assembler.emit_default_string(b));
                    }
                    plankton_core::Encoding::Named(name) => {
                        s.with_bytes(|b| self.assembler.emit_string_with_encoding(&name, b));
                    }
                }
            }
            Variant::Blob(b) => {
                if b.len() > REFERENCEABLE_LEN_THRESHOLD {
                    let offset = self.next_offset();
                    self.seen.insert(identity_key(&value).expect("blobs are referenceable"), offset);
                }
                b.with_bytes(|bytes| self.assembler.emit_blob(bytes));
            }
            Variant::Array(a) => {
                let offset = self.next_offset();
                self.seen.insert(identity_key(&value).expect("arrays are referenceable"), offset);
                self.assembler.begin_array(a.len() as u64);
                for item in a.iter() {
                    self.encode(item);
                }
            }
            Variant::Map(m) => {
                let offset = self.next_offset();
                self.seen.insert(identity_key(&value).expect("maps are referenceable"), offset);
                self.assembler.begin_map(m.len() as u64);
                for (k, v) in m.iter() {
                    self.encode(k);
                    self.encode(v);
                }
            }
            Variant::Object(o) => {
                let offset = self.next_offset();
                self.seen.insert(identity_key(&value).expect("objects are referenceable"), offset);
                let payload = o.payload();
                self.assembler.begin_object(payload.len() as u64);
                self.encode(o.header());
                for (k, v) in payload.iter() {
                    self.encode(k);
                    self.encode(v);
                }
            }
            Variant::Native(n) => {
                let offset = self.next_offset();
                self.seen.insert(identity_key(&value).expect("natives are referenceable"), offset);
                let descriptor = n.descriptor();
                let arena = n.arena();
                let seed = n.with_any(|any| descriptor.encode(any, arena));
                self.encode_seed(seed);
            }
        }
    }

    /// Write the opcode(s) for a seed `Variant` produced by an
    /// [`plankton_core::ObjectType::encode`] callback, without tracking its
    /// own (ephemeral, freshly-allocated) identity in the reference table —
    /// only the originating [`Variant::Native`] instance is a stable,
    /// revisitable identity.
    fn encode_seed(&mut self, seed: Variant<'_>) {
        match seed {
            Variant::Object(o) => {
                let payload = o.payload();
                self.assembler.begin_object(payload.len() as u64);
                self.encode(o.header());
                for (k, v) in payload.iter() {
                    self.encode(k);
                    self.encode(v);
                }
            }
            other => self.encode(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use plankton_core::Arena;

    #[test]
    fn writes_scalars() {
        let writer = BinaryWriter::new();
        assert_eq!(writer.write(Variant::Null), vec![0]);
        assert_eq!(writer.write(Variant::Bool(true)), vec![1]);
        assert_eq!(writer.write(Variant::Bool(false)), vec![2]);
    }

    #[test]
    fn writes_array_then_resets_offsets_next_call() {
        let arena = Arena::new();
        let array = arena.new_array();
        let array_ref = array.as_array().unwrap();
        array_ref.push(Variant::Integer(1)).unwrap();
        let writer = BinaryWriter::new();
        let first = writer.write(array);
        let second = writer.write(array);
        assert_eq!(first, second, "offset space resets per write() call");
    }

    #[test]
    fn self_referential_array_emits_reference_opcode() {
        let arena = Arena::new();
        let array = arena.new_array();
        let array_ref = array.as_array().unwrap();
        array_ref.push(array).unwrap();
        array_ref.freeze();
        let writer = BinaryWriter::new();
        let bytes = writer.write(array);
        // Opcode::Array, length varint(1), Opcode::Reference, offset varint(0)
        assert_eq!(bytes, vec![8, 1, 11, 0]);
    }
}
