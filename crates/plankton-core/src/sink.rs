//! Write-once value cells bound to an arena.

use crate::arena::Arena;
use crate::variant::{ArrayRef, MapRef, ObjectRef, Variant};

/// A single-assignment cell: the first [`Sink::set`] call wins, every later
/// one is rejected by returning `false`.
///
/// Sinks exist so an object's `create`/`complete` callbacks (see
/// [`crate::object_type::ObjectType`]) can be handed a destination for a
/// single scalar result without the caller needing to pre-allocate a
/// container just to hold one value.
#[derive(Debug, Clone, Copy)]
pub struct Sink<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) index: usize,
}

impl<'a> Sink<'a> {
    /// Assign `value` to this sink. Returns `false` if the sink already
    /// holds a value.
    pub fn set(&self, value: Variant<'_>) -> bool {
        self.arena.sink_set(self.index, &value)
    }

    /// The value assigned to this sink, if any.
    #[must_use]
    pub fn get(&self) -> Option<Variant<'a>> {
        self.arena.sink_get(self.index).map(|v| v.to_variant(self.arena))
    }

    /// Allocate a fresh array and assign it to this sink in one step.
    pub fn as_array(&self) -> Option<ArrayRef<'a>> {
        let array = self.arena.new_array();
        if !self.set(array) {
            return None;
        }
        array.as_array()
    }

    /// Allocate a fresh map and assign it to this sink in one step.
    pub fn as_map(&self) -> Option<MapRef<'a>> {
        let map = self.arena.new_map();
        if !self.set(map) {
            return None;
        }
        map.as_map()
    }

    /// Allocate a fresh object with the given header and assign it to this
    /// sink in one step.
    pub fn as_object(&self, header: Variant<'_>) -> Option<ObjectRef<'a>> {
        let object = self.arena.new_object(header);
        if !self.set(object) {
            return None;
        }
        object.as_object()
    }
}
