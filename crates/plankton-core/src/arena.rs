//! Arena allocator owning every non-inline value produced while building or
//! decoding a value tree.
//!
//! Containers, strings and blobs are stored in typed slabs indexed by plain
//! `usize` handles rather than raw pointers, following the handle-based
//! design used elsewhere in the ecosystem for self-referential value graphs.
//! A [`Variant`](crate::variant::Variant) never owns arena memory directly;
//! it only ever carries a shared arena borrow plus a handle, so the whole
//! model stays free of `unsafe`.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::ArenaError;
use crate::object_type::ObjectType;
use crate::variant::{Encoding, Variant};

/// Lifetime-free representation of a single value, as stored inside a slab.
///
/// Every handle variant refers to another slot owned by the *same* arena, so
/// reconstructing a borrowed [`Variant`] only ever needs the arena reference
/// the caller already holds — never one stashed inside the slot itself.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StoredValue {
    Null,
    Bool(bool),
    Integer(i64),
    Id { size: u32, value: u64 },
    String(usize),
    Blob(usize),
    Array(usize),
    Map(usize),
    Object(usize),
    Native(usize),
}

impl StoredValue {
    pub(crate) fn to_variant(self, arena: &Arena) -> Variant<'_> {
        match self {
            StoredValue::Null => Variant::Null,
            StoredValue::Bool(b) => Variant::Bool(b),
            StoredValue::Integer(i) => Variant::Integer(i),
            StoredValue::Id { size, value } => Variant::Id { size, value },
            StoredValue::String(index) => Variant::String(crate::variant::StringRef { arena, index }),
            StoredValue::Blob(index) => Variant::Blob(crate::variant::BlobRef { arena, index }),
            StoredValue::Array(index) => Variant::Array(crate::variant::ArrayRef { arena, index }),
            StoredValue::Map(index) => Variant::Map(crate::variant::MapRef { arena, index }),
            StoredValue::Object(index) => Variant::Object(crate::variant::ObjectRef { arena, index }),
            StoredValue::Native(index) => Variant::Native(crate::variant::NativeRef { arena, index }),
        }
    }

    pub(crate) fn from_variant(value: &Variant<'_>) -> StoredValue {
        match *value {
            Variant::Null => StoredValue::Null,
            Variant::Bool(b) => StoredValue::Bool(b),
            Variant::Integer(i) => StoredValue::Integer(i),
            Variant::Id { size, value } => StoredValue::Id { size, value },
            Variant::String(r) => StoredValue::String(r.index),
            Variant::Blob(r) => StoredValue::Blob(r.index),
            Variant::Array(r) => StoredValue::Array(r.index),
            Variant::Map(r) => StoredValue::Map(r.index),
            Variant::Object(r) => StoredValue::Object(r.index),
            Variant::Native(r) => StoredValue::Native(r.index),
        }
    }
}

pub(crate) struct StringSlot {
    pub(crate) bytes: RefCell<Vec<u8>>,
    pub(crate) encoding: Encoding,
    pub(crate) frozen: Cell<bool>,
}

pub(crate) struct BlobSlot {
    pub(crate) bytes: RefCell<Vec<u8>>,
    pub(crate) frozen: Cell<bool>,
}

pub(crate) struct ArraySlot {
    pub(crate) items: RefCell<Vec<StoredValue>>,
    pub(crate) frozen: Cell<bool>,
}

pub(crate) struct MapSlot {
    pub(crate) entries: RefCell<Vec<(StoredValue, StoredValue)>>,
    pub(crate) frozen: Cell<bool>,
}

pub(crate) struct ObjectSlot {
    pub(crate) header: StoredValue,
    pub(crate) payload: RefCell<StoredValue>,
    pub(crate) frozen: Cell<bool>,
}

pub(crate) struct NativeSlot {
    pub(crate) descriptor: Rc<ObjectType>,
    pub(crate) payload: RefCell<Box<dyn Any>>,
}

/// Owns every value allocated while assembling or decoding a value tree.
///
/// An `Arena` is single-threaded by construction (its slabs sit behind
/// [`RefCell`], which is neither `Sync` nor `Send`); sharing a tree across
/// threads means handing the whole arena to one owning task, not passing
/// individual values around.
#[derive(Default)]
pub struct Arena {
    pub(crate) strings: RefCell<Vec<StringSlot>>,
    pub(crate) blobs: RefCell<Vec<BlobSlot>>,
    pub(crate) arrays: RefCell<Vec<ArraySlot>>,
    pub(crate) maps: RefCell<Vec<MapSlot>>,
    pub(crate) objects: RefCell<Vec<ObjectSlot>>,
    pub(crate) natives: RefCell<Vec<NativeSlot>>,
    pub(crate) sinks: RefCell<Vec<RefCell<Option<StoredValue>>>>,
    destructors: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Drop for Arena {
    fn drop(&mut self) {
        let mut destructors = self.destructors.borrow_mut();
        while let Some(run) = destructors.pop() {
            run();
        }
    }
}

impl Arena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty, mutable array.
    pub fn new_array(&self) -> Variant<'_> {
        self.new_array_with_capacity(0)
    }

    /// Allocate an empty, mutable array with room for `capacity` elements.
    pub fn new_array_with_capacity(&self, capacity: usize) -> Variant<'_> {
        let mut arrays = self.arrays.borrow_mut();
        let index = arrays.len();
        arrays.push(ArraySlot {
            items: RefCell::new(Vec::with_capacity(capacity)),
            frozen: Cell::new(false),
        });
        drop(arrays);
        StoredValue::Array(index).to_variant(self)
    }

    /// Allocate an empty, mutable map.
    pub fn new_map(&self) -> Variant<'_> {
        let mut maps = self.maps.borrow_mut();
        let index = maps.len();
        maps.push(MapSlot {
            entries: RefCell::new(Vec::new()),
            frozen: Cell::new(false),
        });
        drop(maps);
        StoredValue::Map(index).to_variant(self)
    }

    /// Allocate an object with the given header and an empty, mutable
    /// payload map.
    pub fn new_object(&self, header: Variant<'_>) -> Variant<'_> {
        let payload = self.new_map();
        self.new_object_with_payload(header, payload)
    }

    /// Allocate an object with the given header and an already-built
    /// payload map, without allocating a fresh empty one first.
    pub fn new_object_with_payload(&self, header: Variant<'_>, payload: Variant<'_>) -> Variant<'_> {
        let header = StoredValue::from_variant(&header);
        let payload = StoredValue::from_variant(&payload);
        let mut objects = self.objects.borrow_mut();
        let index = objects.len();
        objects.push(ObjectSlot {
            header,
            payload: RefCell::new(payload),
            frozen: Cell::new(false),
        });
        drop(objects);
        StoredValue::Object(index).to_variant(self)
    }

    /// Allocate a native value bound to `descriptor`, wrapping an
    /// arbitrary Rust payload.
    pub fn new_native(&self, descriptor: Rc<ObjectType>, payload: Box<dyn Any>) -> Variant<'_> {
        let mut natives = self.natives.borrow_mut();
        let index = natives.len();
        natives.push(NativeSlot {
            descriptor,
            payload: RefCell::new(payload),
        });
        drop(natives);
        StoredValue::Native(index).to_variant(self)
    }

    /// Allocate a string by copying `contents` with the default encoding.
    pub fn new_string(&self, contents: &str) -> Variant<'_> {
        self.new_string_with_encoding(contents.as_bytes(), Encoding::Utf8)
    }

    /// Allocate a string by copying `bytes`, tagged with `encoding`.
    pub fn new_string_with_encoding(&self, bytes: &[u8], encoding: Encoding) -> Variant<'_> {
        let mut strings = self.strings.borrow_mut();
        let index = strings.len();
        strings.push(StringSlot {
            bytes: RefCell::new(bytes.to_vec()),
            encoding,
            frozen: Cell::new(false),
        });
        drop(strings);
        StoredValue::String(index).to_variant(self)
    }

    /// Allocate a mutable, zero-filled string buffer of `len` bytes.
    pub fn new_mutable_string(&self, len: usize) -> Variant<'_> {
        self.new_string_with_encoding(&vec![0u8; len], Encoding::Utf8)
    }

    /// Allocate a blob by copying `bytes`.
    pub fn new_blob(&self, bytes: &[u8]) -> Variant<'_> {
        let mut blobs = self.blobs.borrow_mut();
        let index = blobs.len();
        blobs.push(BlobSlot {
            bytes: RefCell::new(bytes.to_vec()),
            frozen: Cell::new(false),
        });
        drop(blobs);
        StoredValue::Blob(index).to_variant(self)
    }

    /// Allocate a mutable, zero-filled blob buffer of `len` bytes.
    pub fn new_mutable_blob(&self, len: usize) -> Variant<'_> {
        self.new_blob(&vec![0u8; len])
    }

    /// Intern `s` into the arena, the same as [`Arena::new_string`].
    ///
    /// This copies `s` into arena storage rather than aliasing the caller's
    /// buffer: every `Variant<'a>` this crate hands out borrows from the
    /// arena itself, so an aliasing string would need the arena's slot
    /// storage to carry the external buffer's lifetime rather than the
    /// arena's own. Kept as a distinct entry point for callers adopting
    /// externally-sourced buffers, even though today it is equivalent to
    /// `new_string`.
    pub fn adopt_str(&self, s: &str) -> Variant<'_> {
        self.new_string(s)
    }

    /// Intern `bytes` into the arena, the same as [`Arena::new_blob`] (see
    /// [`Arena::adopt_str`]).
    pub fn adopt_bytes(&self, bytes: &[u8]) -> Variant<'_> {
        self.new_blob(bytes)
    }

    /// Allocate a fresh, unassigned sink cell.
    pub fn new_sink(&self) -> crate::sink::Sink<'_> {
        let mut sinks = self.sinks.borrow_mut();
        let index = sinks.len();
        sinks.push(RefCell::new(None));
        drop(sinks);
        crate::sink::Sink { arena: self, index }
    }

    /// Register a destructor to run, in LIFO order, when this arena is
    /// dropped.
    pub fn on_drop(&self, destructor: impl FnOnce() + 'static) {
        self.destructors.borrow_mut().push(Box::new(destructor));
    }

    pub(crate) fn array_len(&self, index: usize) -> usize {
        self.arrays.borrow()[index].items.borrow().len()
    }

    pub(crate) fn array_get(&self, index: usize, i: usize) -> Option<StoredValue> {
        self.arrays.borrow()[index].items.borrow().get(i).copied()
    }

    pub(crate) fn array_push(&self, index: usize, value: &Variant<'_>) -> Result<(), ArenaError> {
        let arrays = self.arrays.borrow();
        let slot = &arrays[index];
        if slot.frozen.get() {
            return Err(ArenaError::Frozen);
        }
        slot.items.borrow_mut().push(StoredValue::from_variant(value));
        Ok(())
    }

    pub(crate) fn array_items(&self, index: usize) -> Vec<StoredValue> {
        self.arrays.borrow()[index].items.borrow().clone()
    }

    pub(crate) fn array_is_frozen(&self, index: usize) -> bool {
        self.arrays.borrow()[index].frozen.get()
    }

    pub(crate) fn array_freeze(&self, index: usize) {
        self.arrays.borrow()[index].frozen.set(true);
    }

    pub(crate) fn map_len(&self, index: usize) -> usize {
        self.maps.borrow()[index].entries.borrow().len()
    }

    pub(crate) fn map_entries(&self, index: usize) -> Vec<(StoredValue, StoredValue)> {
        self.maps.borrow()[index].entries.borrow().clone()
    }

    pub(crate) fn map_get(&self, index: usize, key: &Variant<'_>) -> Option<StoredValue> {
        let key = StoredValue::from_variant(key);
        self.maps.borrow()[index]
            .entries
            .borrow()
            .iter()
            .find(|(k, _)| stored_eq(self, *k, key))
            .map(|(_, v)| *v)
    }

    /// Insert `key`/`value` unless `key` already has an entry, in which case
    /// the existing entry is left untouched: lookups always return the
    /// first-inserted value for a given key, even when the input duplicates
    /// a key.
    pub(crate) fn map_set(
        &self,
        index: usize,
        key: &Variant<'_>,
        value: &Variant<'_>,
    ) -> Result<(), ArenaError> {
        let maps = self.maps.borrow();
        let slot = &maps[index];
        if slot.frozen.get() {
            return Err(ArenaError::Frozen);
        }
        let key_stored = StoredValue::from_variant(key);
        let mut entries = slot.entries.borrow_mut();
        if entries.iter().any(|(k, _)| stored_eq(self, *k, key_stored)) {
            return Ok(());
        }
        entries.push((key_stored, StoredValue::from_variant(value)));
        Ok(())
    }

    pub(crate) fn map_is_frozen(&self, index: usize) -> bool {
        self.maps.borrow()[index].frozen.get()
    }

    pub(crate) fn map_freeze(&self, index: usize) {
        self.maps.borrow()[index].frozen.set(true);
    }

    pub(crate) fn object_header(&self, index: usize) -> StoredValue {
        self.objects.borrow()[index].header
    }

    pub(crate) fn object_payload(&self, index: usize) -> StoredValue {
        *self.objects.borrow()[index].payload.borrow()
    }

    pub(crate) fn object_is_frozen(&self, index: usize) -> bool {
        self.objects.borrow()[index].frozen.get()
    }

    pub(crate) fn object_freeze(&self, index: usize) {
        let objects = self.objects.borrow();
        objects[index].frozen.set(true);
        if let StoredValue::Map(map_index) = *objects[index].payload.borrow() {
            drop(objects);
            self.map_freeze(map_index);
        }
    }

    pub(crate) fn native_descriptor(&self, index: usize) -> Rc<ObjectType> {
        Rc::clone(&self.natives.borrow()[index].descriptor)
    }

    pub(crate) fn native_with_payload<R>(
        &self,
        index: usize,
        f: impl FnOnce(&dyn Any) -> R,
    ) -> R {
        let natives = self.natives.borrow();
        let payload = natives[index].payload.borrow();
        f(&**payload)
    }

    pub(crate) fn native_with_payload_mut<R>(
        &self,
        index: usize,
        f: impl FnOnce(&mut dyn Any) -> R,
    ) -> R {
        let natives = self.natives.borrow();
        let mut payload = natives[index].payload.borrow_mut();
        f(&mut **payload)
    }

    pub(crate) fn string_is_frozen(&self, index: usize) -> bool {
        self.strings.borrow()[index].frozen.get()
    }

    pub(crate) fn string_freeze(&self, index: usize) {
        self.strings.borrow()[index].frozen.set(true);
    }

    pub(crate) fn string_len(&self, index: usize) -> usize {
        self.strings.borrow()[index].bytes.borrow().len()
    }

    pub(crate) fn string_encoding(&self, index: usize) -> Encoding {
        self.strings.borrow()[index].encoding.clone()
    }

    pub(crate) fn string_with_bytes<R>(&self, index: usize, f: impl FnOnce(&[u8]) -> R) -> R {
        let strings = self.strings.borrow();
        let bytes = strings[index].bytes.borrow();
        f(&bytes)
    }

    pub(crate) fn string_set_byte(
        &self,
        index: usize,
        offset: usize,
        byte: u8,
    ) -> Result<(), ArenaError> {
        let strings = self.strings.borrow();
        let slot = &strings[index];
        if slot.frozen.get() {
            return Err(ArenaError::Frozen);
        }
        let mut bytes = slot.bytes.borrow_mut();
        let len = bytes.len();
        let slot_ref = bytes.get_mut(offset).ok_or(ArenaError::OutOfBounds { offset, len })?;
        *slot_ref = byte;
        Ok(())
    }

    pub(crate) fn blob_is_frozen(&self, index: usize) -> bool {
        self.blobs.borrow()[index].frozen.get()
    }

    pub(crate) fn blob_freeze(&self, index: usize) {
        self.blobs.borrow()[index].frozen.set(true);
    }

    pub(crate) fn blob_len(&self, index: usize) -> usize {
        self.blobs.borrow()[index].bytes.borrow().len()
    }

    pub(crate) fn blob_with_bytes<R>(&self, index: usize, f: impl FnOnce(&[u8]) -> R) -> R {
        let blobs = self.blobs.borrow();
        let bytes = blobs[index].bytes.borrow();
        f(&bytes)
    }

    pub(crate) fn blob_set_byte(
        &self,
        index: usize,
        offset: usize,
        byte: u8,
    ) -> Result<(), ArenaError> {
        let blobs = self.blobs.borrow();
        let slot = &blobs[index];
        if slot.frozen.get() {
            return Err(ArenaError::Frozen);
        }
        let mut bytes = slot.bytes.borrow_mut();
        let len = bytes.len();
        let slot_ref = bytes.get_mut(offset).ok_or(ArenaError::OutOfBounds { offset, len })?;
        *slot_ref = byte;
        Ok(())
    }

    pub(crate) fn sink_set(&self, index: usize, value: &Variant<'_>) -> bool {
        let sinks = self.sinks.borrow();
        let mut slot = sinks[index].borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(StoredValue::from_variant(value));
        true
    }

    pub(crate) fn sink_get(&self, index: usize) -> Option<StoredValue> {
        *self.sinks.borrow()[index].borrow()
    }
}

pub(crate) fn stored_eq(arena: &Arena, a: StoredValue, b: StoredValue) -> bool {
    crate::variant::variants_eq(&a.to_variant(arena), &b.to_variant(arena))
}
