//! The `Variant` value type and the handle types it is built from.

use std::rc::Rc;
use std::sync::Arc;

use crate::arena::Arena;
use crate::error::ArenaError;
use crate::object_type::ObjectType;

/// Tag describing how a string's bytes should be interpreted.
///
/// The format itself carries no charset tables or transcoding logic;
/// `Encoding` only remembers which tag a string was decoded or constructed
/// with so it can be re-emitted unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// The default, unlabelled encoding.
    Utf8,
    /// A named, non-default encoding (round-tripped opaquely).
    Named(Arc<str>),
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

/// A self-describing value: either an inline scalar or a handle into an
/// [`Arena`].
///
/// Containers compare by identity (same arena, same slot); scalars, strings
/// and blobs compare structurally. See [`variants_eq`].
#[derive(Debug, Clone, Copy)]
pub enum Variant<'a> {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Integer(i64),
    /// An opaque identifier of up to 8 bytes, kept distinct from `Integer`
    /// so callers can round-trip binary identifiers without reinterpreting
    /// them as numbers.
    Id {
        /// Width of the identifier in bytes (1-8).
        size: u32,
        /// The identifier's value, right-aligned in a `u64`.
        value: u64,
    },
    /// A UTF-8 (or otherwise encoded) string, owned by an arena.
    String(StringRef<'a>),
    /// A byte blob, owned by an arena.
    Blob(BlobRef<'a>),
    /// An ordered, arena-owned sequence of values.
    Array(ArrayRef<'a>),
    /// An arena-owned association of values to values.
    Map(MapRef<'a>),
    /// A typed object: a header value plus a payload, arena-owned.
    Object(ObjectRef<'a>),
    /// An arena-owned native Rust value bound to an [`ObjectType`].
    Native(NativeRef<'a>),
}

impl<'a> Variant<'a> {
    /// `true` for [`Variant::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    /// The boolean value, if this is [`Variant::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer value, if this is [`Variant::Integer`].
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Variant::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The string handle, if this is [`Variant::String`].
    #[must_use]
    pub fn as_string(&self) -> Option<StringRef<'a>> {
        match self {
            Variant::String(s) => Some(*s),
            _ => None,
        }
    }

    /// The blob handle, if this is [`Variant::Blob`].
    #[must_use]
    pub fn as_blob(&self) -> Option<BlobRef<'a>> {
        match self {
            Variant::Blob(b) => Some(*b),
            _ => None,
        }
    }

    /// The array handle, if this is [`Variant::Array`].
    #[must_use]
    pub fn as_array(&self) -> Option<ArrayRef<'a>> {
        match self {
            Variant::Array(a) => Some(*a),
            _ => None,
        }
    }

    /// The map handle, if this is [`Variant::Map`].
    #[must_use]
    pub fn as_map(&self) -> Option<MapRef<'a>> {
        match self {
            Variant::Map(m) => Some(*m),
            _ => None,
        }
    }

    /// The object handle, if this is [`Variant::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<ObjectRef<'a>> {
        match self {
            Variant::Object(o) => Some(*o),
            _ => None,
        }
    }

    /// The native handle, if this is [`Variant::Native`].
    #[must_use]
    pub fn as_native(&self) -> Option<NativeRef<'a>> {
        match self {
            Variant::Native(n) => Some(*n),
            _ => None,
        }
    }

    /// Freeze this value in place, if it is a container or string/blob.
    /// Scalars are already immutable and this is a no-op for them.
    pub fn freeze(&self) {
        match self {
            Variant::String(s) => s.freeze(),
            Variant::Blob(b) => b.freeze(),
            Variant::Array(a) => a.freeze(),
            Variant::Map(m) => m.freeze(),
            Variant::Object(o) => o.freeze(),
            _ => {}
        }
    }

    /// `true` if this value has been frozen. Scalars are always frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        match self {
            Variant::String(s) => s.is_frozen(),
            Variant::Blob(b) => b.is_frozen(),
            Variant::Array(a) => a.is_frozen(),
            Variant::Map(m) => m.is_frozen(),
            Variant::Object(o) => o.is_frozen(),
            _ => true,
        }
    }
}

impl PartialEq for Variant<'_> {
    fn eq(&self, other: &Self) -> bool {
        variants_eq(self, other)
    }
}

/// Structural equality for scalars, strings and blobs; identity equality
/// (same arena, same slot) for arrays, maps, objects and natives — per the
/// freeze/equality invariant in the format's data model.
#[must_use]
pub fn variants_eq(a: &Variant<'_>, b: &Variant<'_>) -> bool {
    match (a, b) {
        (Variant::Null, Variant::Null) => true,
        (Variant::Bool(x), Variant::Bool(y)) => x == y,
        (Variant::Integer(x), Variant::Integer(y)) => x == y,
        (Variant::Id { size: sx, value: vx }, Variant::Id { size: sy, value: vy }) => {
            sx == sy && vx == vy
        }
        (Variant::String(x), Variant::String(y)) => x.with_bytes(|bx| y.with_bytes(|by| bx == by)),
        (Variant::Blob(x), Variant::Blob(y)) => x.with_bytes(|bx| y.with_bytes(|by| bx == by)),
        (Variant::Array(x), Variant::Array(y)) => {
            std::ptr::eq(x.arena, y.arena) && x.index == y.index
        }
        (Variant::Map(x), Variant::Map(y)) => std::ptr::eq(x.arena, y.arena) && x.index == y.index,
        (Variant::Object(x), Variant::Object(y)) => {
            std::ptr::eq(x.arena, y.arena) && x.index == y.index
        }
        (Variant::Native(x), Variant::Native(y)) => {
            std::ptr::eq(x.arena, y.arena) && x.index == y.index
        }
        _ => false,
    }
}

/// A stable identity for a referenceable variant: same arena, same kind, same
/// slot. `None` for scalars, which are never referenceable.
///
/// Used by the binary writer's reference table to detect when the *same*
/// container/string/blob/native instance is revisited during a tree walk,
/// as distinct from two separately built values that merely compare equal.
#[must_use]
pub fn identity_key(value: &Variant<'_>) -> Option<(usize, u8, usize)> {
    match value {
        Variant::String(r) => Some((std::ptr::from_ref(r.arena) as usize, 0, r.index)),
        Variant::Blob(r) => Some((std::ptr::from_ref(r.arena) as usize, 1, r.index)),
        Variant::Array(r) => Some((std::ptr::from_ref(r.arena) as usize, 2, r.index)),
        Variant::Map(r) => Some((std::ptr::from_ref(r.arena) as usize, 3, r.index)),
        Variant::Object(r) => Some((std::ptr::from_ref(r.arena) as usize, 4, r.index)),
        Variant::Native(r) => Some((std::ptr::from_ref(r.arena) as usize, 5, r.index)),
        Variant::Null | Variant::Bool(_) | Variant::Integer(_) | Variant::Id { .. } => None,
    }
}

/// A handle to an arena-owned string.
#[derive(Debug, Clone, Copy)]
pub struct StringRef<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) index: usize,
}

impl<'a> StringRef<'a> {
    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.string_len(self.index)
    }

    /// `true` if the string holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The encoding tag this string was created or decoded with.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.arena.string_encoding(self.index)
    }

    /// Run `f` against the string's raw bytes without copying them out.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.arena.string_with_bytes(self.index, f)
    }

    /// Copy the string's bytes out, validating UTF-8.
    pub fn to_str_lossy(&self) -> String {
        self.with_bytes(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Overwrite a single byte in a still-mutable string buffer.
    pub fn set_byte(&self, offset: usize, byte: u8) -> Result<(), ArenaError> {
        self.arena.string_set_byte(self.index, offset, byte)
    }

    /// Freeze the string, making it immutable from this point on.
    pub fn freeze(&self) {
        self.arena.string_freeze(self.index);
    }

    /// `true` if the string has been frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.arena.string_is_frozen(self.index)
    }
}

/// A handle to an arena-owned blob.
#[derive(Debug, Clone, Copy)]
pub struct BlobRef<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) index: usize,
}

impl<'a> BlobRef<'a> {
    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.blob_len(self.index)
    }

    /// `true` if the blob holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the blob's raw bytes without copying them out.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.arena.blob_with_bytes(self.index, f)
    }

    /// Copy the blob's bytes out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.with_bytes(<[u8]>::to_vec)
    }

    /// Overwrite a single byte in a still-mutable blob buffer.
    pub fn set_byte(&self, offset: usize, byte: u8) -> Result<(), ArenaError> {
        self.arena.blob_set_byte(self.index, offset, byte)
    }

    /// Freeze the blob, making it immutable from this point on.
    pub fn freeze(&self) {
        self.arena.blob_freeze(self.index);
    }

    /// `true` if the blob has been frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.arena.blob_is_frozen(self.index)
    }
}

/// A handle to an arena-owned, ordered sequence of values.
#[derive(Debug, Clone, Copy)]
pub struct ArrayRef<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) index: usize,
}

impl<'a> ArrayRef<'a> {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.array_len(self.index)
    }

    /// `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `i`, if in bounds.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<Variant<'a>> {
        self.arena.array_get(self.index, i).map(|v| v.to_variant(self.arena))
    }

    /// Append a value. Fails if the array has been frozen.
    pub fn push(&self, value: Variant<'_>) -> Result<(), ArenaError> {
        self.arena.array_push(self.index, &value)
    }

    /// Iterate over the array's current elements.
    pub fn iter(&self) -> impl Iterator<Item = Variant<'a>> + '_ {
        let arena = self.arena;
        self.arena
            .array_items(self.index)
            .into_iter()
            .map(move |v| v.to_variant(arena))
    }

    /// Freeze the array, making it immutable from this point on. Freezing
    /// is shallow: elements that are themselves containers are unaffected.
    pub fn freeze(&self) {
        self.arena.array_freeze(self.index);
    }

    /// `true` if the array has been frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.arena.array_is_frozen(self.index)
    }
}

/// A handle to an arena-owned association of values to values.
#[derive(Debug, Clone, Copy)]
pub struct MapRef<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) index: usize,
}

impl<'a> MapRef<'a> {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.map_len(self.index)
    }

    /// `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value associated with `key`, if present. Keys need not be unique
    /// in the map's entries; lookup returns the first match.
    #[must_use]
    pub fn get(&self, key: &Variant<'_>) -> Option<Variant<'a>> {
        self.arena.map_get(self.index, key).map(|v| v.to_variant(self.arena))
    }

    /// Associate `key` with `value`. If `key` already has an entry, the
    /// existing entry is left untouched and this call is a no-op (lookup
    /// always returns the first-inserted value for a key). Fails if the map
    /// has been frozen.
    pub fn set(&self, key: Variant<'_>, value: Variant<'_>) -> Result<(), ArenaError> {
        self.arena.map_set(self.index, &key, &value)
    }

    /// Iterate over the map's current entries.
    pub fn iter(&self) -> impl Iterator<Item = (Variant<'a>, Variant<'a>)> + '_ {
        let arena = self.arena;
        self.arena
            .map_entries(self.index)
            .into_iter()
            .map(move |(k, v)| (k.to_variant(arena), v.to_variant(arena)))
    }

    /// Freeze the map, making it immutable from this point on.
    pub fn freeze(&self) {
        self.arena.map_freeze(self.index);
    }

    /// `true` if the map has been frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.arena.map_is_frozen(self.index)
    }
}

/// A handle to an arena-owned typed object: a header value identifying its
/// type plus a payload map of fields.
#[derive(Debug, Clone, Copy)]
pub struct ObjectRef<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) index: usize,
}

impl<'a> ObjectRef<'a> {
    /// The object's header, used to look a type up in a [`crate::registry::TypeRegistry`].
    #[must_use]
    pub fn header(&self) -> Variant<'a> {
        self.arena.object_header(self.index).to_variant(self.arena)
    }

    /// The object's field payload, as a map.
    #[must_use]
    pub fn payload(&self) -> MapRef<'a> {
        match self.arena.object_payload(self.index).to_variant(self.arena) {
            Variant::Map(m) => m,
            _ => unreachable!("object payload is always constructed as a map"),
        }
    }

    /// Freeze the object (and its payload map). Freezing is shallow beyond
    /// that: field values that are themselves containers are unaffected.
    pub fn freeze(&self) {
        self.arena.object_freeze(self.index);
    }

    /// `true` if the object has been frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.arena.object_is_frozen(self.index)
    }
}

/// A handle to an arena-owned native Rust value, reachable only through its
/// bound [`ObjectType`] descriptor.
#[derive(Debug, Clone, Copy)]
pub struct NativeRef<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) index: usize,
}

impl<'a> NativeRef<'a> {
    /// The descriptor this native value was created against.
    #[must_use]
    pub fn descriptor(&self) -> Rc<ObjectType> {
        self.arena.native_descriptor(self.index)
    }

    /// Borrow the native payload through an arbitrary closure. Returns
    /// `None` if `descriptor` is not the exact descriptor this value was
    /// created with (pointer identity, no RTTI).
    pub fn downcast_ref<T: 'static, R>(
        &self,
        descriptor: &Rc<ObjectType>,
        f: impl FnOnce(&T) -> R,
    ) -> Option<R> {
        if !Rc::ptr_eq(&self.descriptor(), descriptor) {
            return None;
        }
        self.arena
            .native_with_payload(self.index, |any| any.downcast_ref::<T>().map(f))
    }

    /// Mutably borrow the native payload through an arbitrary closure. See
    /// [`NativeRef::downcast_ref`].
    pub fn downcast_mut<T: 'static, R>(
        &self,
        descriptor: &Rc<ObjectType>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        if !Rc::ptr_eq(&self.descriptor(), descriptor) {
            return None;
        }
        self.arena
            .native_with_payload_mut(self.index, |any| any.downcast_mut::<T>().map(f))
    }

    /// Borrow the native payload as `&dyn Any`, without a descriptor check.
    ///
    /// Used by the binary codec's encode path, which only needs to hand the
    /// payload to the owning [`ObjectType`]'s own `encode` callback and has
    /// no concrete `T` of its own to downcast to.
    pub fn with_any<R>(&self, f: impl FnOnce(&dyn std::any::Any) -> R) -> R {
        self.arena.native_with_payload(self.index, f)
    }

    /// Mutably borrow the native payload as `&mut dyn Any`. See
    /// [`NativeRef::with_any`].
    pub fn with_any_mut<R>(&self, f: impl FnOnce(&mut dyn std::any::Any) -> R) -> R {
        self.arena.native_with_payload_mut(self.index, f)
    }

    /// A stable identity for this native value: same arena, same slot. Used
    /// by the binary writer's reference table.
    #[must_use]
    pub fn identity(&self) -> usize {
        self.index
    }

    /// The arena this native value is allocated in, so callers outside this
    /// crate (the binary codec's encode path) can hand it back to the
    /// owning [`ObjectType`]'s `encode` callback.
    #[must_use]
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }
}
