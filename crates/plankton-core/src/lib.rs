// SPDX-License-Identifier: Apache-2.0
//! Variant data model, arena allocator and native object-type registry for
//! the Plankton data-interchange format.

pub mod arena;
pub mod error;
pub mod object_type;
pub mod registry;
pub mod sink;
pub mod variant;

pub use arena::Arena;
pub use error::ArenaError;
pub use object_type::{HeaderKey, ObjectType, OwnedVariant};
pub use registry::TypeRegistry;
pub use sink::Sink;
pub use variant::{
    identity_key, ArrayRef, BlobRef, Encoding, MapRef, NativeRef, ObjectRef, StringRef, Variant,
};

/// The in-memory wire format version this crate implements. Embedders that
/// negotiate compatibility across a boundary can compare against it; the
/// codec itself does not encode it anywhere on the wire.
pub const WIRE_FORMAT_VERSION: u8 = 1;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn arena_array_push_and_freeze() {
        let arena = Arena::new();
        let array = arena.new_array();
        let array_ref = array.as_array().unwrap();
        array_ref.push(Variant::Integer(1)).unwrap();
        array_ref.push(Variant::Bool(true)).unwrap();
        assert_eq!(array_ref.len(), 2);
        assert_eq!(array_ref.get(0).unwrap().as_integer(), Some(1));

        array_ref.freeze();
        assert!(array_ref.is_frozen());
        assert!(array_ref.push(Variant::Null).is_err());
    }

    #[test]
    fn map_lookup_returns_first_match_for_duplicate_keys() {
        let arena = Arena::new();
        let map = arena.new_map().as_map().unwrap();
        let key = arena.new_string("k");
        map.set(key, Variant::Integer(1)).unwrap();
        map.set(key, Variant::Integer(2)).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&key).unwrap().as_integer(), Some(1));
    }

    #[test]
    fn sink_is_write_once() {
        let arena = Arena::new();
        let sink = arena.new_sink();
        assert!(sink.set(Variant::Integer(1)));
        assert!(!sink.set(Variant::Integer(2)));
        assert_eq!(sink.get().unwrap().as_integer(), Some(1));
    }

    #[test]
    fn container_equality_is_identity() {
        let arena = Arena::new();
        let a = arena.new_array();
        let b = arena.new_array();
        assert_eq!(a, a);
        assert_ne!(a, b);
    }

    #[test]
    fn string_equality_is_structural() {
        let arena = Arena::new();
        let a = arena.new_string("hello");
        let b = arena.new_string("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn freeze_is_shallow() {
        let arena = Arena::new();
        let outer = arena.new_array().as_array().unwrap();
        let inner = arena.new_array();
        let inner_ref = inner.as_array().unwrap();
        outer.push(inner).unwrap();
        outer.freeze();
        assert!(outer.is_frozen());
        assert!(!inner_ref.is_frozen());
        inner_ref.push(Variant::Integer(7)).unwrap();
    }

    #[test]
    fn object_freeze_also_freezes_payload() {
        let arena = Arena::new();
        let header = arena.new_string("demo.Point");
        let object = arena.new_object(header).as_object().unwrap();
        let x = arena.new_string("x");
        object.payload().set(x, Variant::Integer(3)).unwrap();
        object.freeze();
        assert!(object.payload().is_frozen());
        assert!(object.payload().set(x, Variant::Integer(4)).is_err());
    }
}
