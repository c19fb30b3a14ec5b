//! Decodes a binary opcode stream back into a [`Variant`] tree, resolving
//! back-references and driving the marshalling layer's two-phase object
//! reconstruction.

use plankton_core::{Arena, TypeRegistry, Variant};

use crate::error::DecodeError;
use crate::opcode::Opcode;
use crate::varint::{read_biased_uvarint, zigzag_decode};
use crate::writer::REFERENCEABLE_LEN_THRESHOLD;

/// An entry in the reference table, indexed by the offset the encoder
/// assigned it. `Pending` marks an atomic object under construction: a
/// `REFERENCE` that targets it is a decode error rather than a resolved
/// value, since atomic types cannot participate in cycles.
enum RefSlot<'a> {
    Pending,
    Filled(Variant<'a>),
}

/// Decodes binary-encoded [`Variant`] trees into a target [`Arena`].
///
/// Bound to the arena values are allocated into and, optionally, a
/// [`TypeRegistry`] used to resolve `OBJECT` headers into native host types
/// native host types. Without a registry every object decodes to a generic
/// seed [`Variant::Object`].
pub struct BinaryReader<'a> {
    arena: &'a Arena,
    registry: Option<&'a TypeRegistry>,
}

impl<'a> BinaryReader<'a> {
    /// Create a reader that allocates into `arena` with no type registry.
    #[must_use]
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            registry: None,
        }
    }

    /// Attach a type registry used to resolve object headers during decode.
    #[must_use]
    pub fn with_registry(mut self, registry: &'a TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Decode one top-level value from `bytes`.
    ///
    /// The reference-offset counter starts fresh for every call, mirroring
    /// the writer's per-call reference space.
    pub fn parse(&self, bytes: &[u8]) -> Result<Variant<'a>, DecodeError> {
        let mut session = ReadSession {
            arena: self.arena,
            registry: self.registry,
            refs: Vec::new(),
        };
        let mut cursor = 0;
        session.decode(bytes, &mut cursor)
    }
}

struct ReadSession<'a> {
    arena: &'a Arena,
    registry: Option<&'a TypeRegistry>,
    refs: Vec<RefSlot<'a>>,
}

impl<'a> ReadSession<'a> {
    fn decode(&mut self, bytes: &[u8], cursor: &mut usize) -> Result<Variant<'a>, DecodeError> {
        let offset = *cursor;
        let tag = *bytes
            .get(offset)
            .ok_or(DecodeError::UnexpectedEof { offset })?;
        *cursor += 1;
        let opcode =
            Opcode::from_u8(tag).ok_or(DecodeError::UnknownOpcode { byte: tag, offset })?;
        match opcode {
            Opcode::Null => Ok(Variant::Null),
            Opcode::True => Ok(Variant::Bool(true)),
            Opcode::False => Ok(Variant::Bool(false)),
            Opcode::Int64 => {
                let zigzag = read_biased_uvarint(bytes, cursor)?;
                Ok(Variant::Integer(zigzag_decode(zigzag)))
            }
            Opcode::Id => {
                let size = read_biased_uvarint(bytes, cursor)?;
                let value = read_biased_uvarint(bytes, cursor)?;
                Ok(Variant::Id {
                    size: size as u32,
                    value,
                })
            }
            Opcode::DefaultString => {
                let len = read_biased_uvarint(bytes, cursor)? as usize;
                let slice = self.take_bytes(bytes, cursor, len)?;
                let value = self.arena.new_string_with_encoding(slice, plankton_core::Encoding::Utf8);
                self.register_if_referenceable(len, value);
                Ok(value)
            }
            Opcode::StringWithEncoding => {
                let name_len = read_biased_uvarint(bytes, cursor)? as usize;
                let name_bytes = self.take_bytes(bytes, cursor, name_len)?;
                let name = String::from_utf8_lossy(name_bytes).into_owned();
                let len = read_biased_uvarint(bytes, cursor)? as usize;
                let slice = self.take_bytes(bytes, cursor, len)?;
                let value = self.arena.new_string_with_encoding(
                    slice,
                    plankton_core::Encoding::Named(name.into()),
                );
                self.register_if_referenceable(len, value);
                Ok(value)
            }
            Opcode::Blob => {
                let len = read_biased_uvarint(bytes, cursor)? as usize;
                let slice = self.take_bytes(bytes, cursor, len)?;
                let value = self.arena.new_blob(slice);
                self.register_if_referenceable(len, value);
                Ok(value)
            }
            Opcode::Array => self.decode_array(bytes, cursor),
            Opcode::Map => self.decode_map(bytes, cursor),
            Opcode::Object => self.decode_object(bytes, cursor),
            Opcode::Reference => {
                let id = read_biased_uvarint(bytes, cursor)?;
                match self.refs.get(id as usize) {
                    Some(RefSlot::Filled(v)) => Ok(*v),
                    Some(RefSlot::Pending) => Err(DecodeError::ReferenceIntoAtomic),
                    None => Err(DecodeError::DanglingReference { id }),
                }
            }
        }
    }

    fn take_bytes<'b>(
        &self,
        bytes: &'b [u8],
        cursor: &mut usize,
        len: usize,
    ) -> Result<&'b [u8], DecodeError> {
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

    /// Reserve a slot for a value that is not yet known (atomic objects
    /// under construction); returns its offset.
    fn reserve_pending(&mut self) -> usize {
        let id = self.refs.len();
        self.refs.push(RefSlot::Pending);
        id
    }

    /// Register `value` at the next reference offset immediately, so a
    /// nested `REFERENCE` can resolve to it while its children are still
    /// being decoded.
    fn register(&mut self, value: Variant<'a>) -> usize {
        let id = self.refs.len();
        self.refs.push(RefSlot::Filled(value));
        id
    }

    /// Mirror the writer's `REFERENCEABLE_LEN_THRESHOLD` decision for
    /// strings and blobs: only values the writer would have assigned an
    /// offset to consume one here, keeping the two offset counters in sync.
    fn register_if_referenceable(&mut self, len: usize, value: Variant<'a>) {
        if len > REFERENCEABLE_LEN_THRESHOLD {
            self.register(value);
        }
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn decode_array(&mut self, bytes: &[u8], cursor: &mut usize) -> Result<Variant<'a>, DecodeError> {
        let length = read_biased_uvarint(bytes, cursor)? as usize;
        let array = self.arena.new_array_with_capacity(length);
        let array_ref = array.as_array().expect("just allocated as an array");
        self.register(array);
        for _ in 0..length {
            let element = self.decode(bytes, cursor)?;
            array_ref.push(element)?;
        }
        array_ref.freeze();
        Ok(array)
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn decode_map(&mut self, bytes: &[u8], cursor: &mut usize) -> Result<Variant<'a>, DecodeError> {
        let size = read_biased_uvarint(bytes, cursor)? as usize;
        let map = self.arena.new_map();
        let map_ref = map.as_map().expect("just allocated as a map");
        self.register(map);
        for _ in 0..size {
            let key = self.decode(bytes, cursor)?;
            let value = self.decode(bytes, cursor)?;
            map_ref.set(key, value)?;
        }
        map_ref.freeze();
        Ok(map)
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn decode_object(&mut self, bytes: &[u8], cursor: &mut usize) -> Result<Variant<'a>, DecodeError> {
        let field_count = read_biased_uvarint(bytes, cursor)? as usize;
        // The field count precedes the header on the wire, but the header
        // must still be decoded before we know whether a registered
        // descriptor wants to reserve this object's identity up front.
        let header = self.decode(bytes, cursor)?;
        let descriptor = self.registry.and_then(|r| r.lookup(&header));

        match descriptor {
            Some(d) if !d.is_atomic() => {
                let native_payload = d.create(self.arena).ok_or(DecodeError::ObjectTypeProducedNoPayload)?;
                let native = self.arena.new_native(d.clone(), native_payload);
                self.register(native);
                let payload = self.decode_payload_map(bytes, cursor, field_count)?;
                let seed = self.arena.new_object_with_payload(header, payload);
                let seed_ref = seed.as_object().expect("just allocated as an object");
                let native_ref = native.as_native().expect("just allocated as a native");
                native_ref.with_any_mut(|any| d.complete(any, seed_ref, self.arena));
                Ok(native)
            }
            Some(d) if d.is_atomic() => {
                let slot = self.reserve_pending();
                let payload = self.decode_payload_map(bytes, cursor, field_count)?;
                let seed = self.arena.new_object_with_payload(header, payload);
                let seed_ref = seed.as_object().expect("just allocated as an object");
                let native_payload = d
                    .build_atomic(seed_ref, self.arena)
                    .ok_or(DecodeError::ObjectTypeProducedNoPayload)?;
                let native = self.arena.new_native(d.clone(), native_payload);
                self.refs[slot] = RefSlot::Filled(native);
                Ok(native)
            }
            _ => {
                let payload = self.arena.new_map();
                let payload_ref = payload.as_map().expect("just allocated as a map");
                let object = self.arena.new_object_with_payload(header, payload);
                self.register(object);
                for _ in 0..field_count {
                    let key = self.decode(bytes, cursor)?;
                    let value = self.decode(bytes, cursor)?;
                    payload_ref.set(key, value)?;
                }
                object.as_object().expect("just allocated as an object").freeze();
                Ok(object)
            }
        }
    }

    // Invariant: the value just came out of an Arena constructor for this
    // exact kind, so the as_*/identity_key projection cannot fail here.
    #[allow(clippy::expect_used)]
    fn decode_payload_map(
        &mut self,
        bytes: &[u8],
        cursor: &mut usize,
        field_count: usize,
    ) -> Result<Variant<'a>, DecodeError> {
        let payload = self.arena.new_map();
        let payload_ref = payload.as_map().expect("just allocated as a map");
        for _ in 0..field_count {
            let key = self.decode(bytes, cursor)?;
            let value = self.decode(bytes, cursor)?;
            payload_ref.set(key, value)?;
        }
        payload_ref.freeze();
        Ok(payload)
    }
}
