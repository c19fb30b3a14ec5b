// SPDX-License-Identifier: Apache-2.0
//! Ergonomic front door for native Rust object marshalling over
//! `plankton-core`'s [`ObjectType`]/[`TypeRegistry`] and `plankton-binary`'s
//! two-phase decode path.
//!
//! Mirrors `ObjectType<T>`/`TypeRegistry` in
//! `examples/original_source/src/c/marshal.hh`: a type is described once
//! (header, optional create/complete or atomic-build, optional encode) and
//! registered; a [`plankton_binary::BinaryReader`] bound to the resulting
//! registry then reconstructs native values directly instead of generic
//! seed objects.

use std::any::Any;
use std::rc::Rc;

use plankton_core::{Arena, HeaderKey, ObjectRef, ObjectType, TypeRegistry, Variant};

/// Accumulates [`ObjectType`] descriptors and produces a [`TypeRegistry`].
///
/// Exists only to give registration call sites a fluent, header-first shape
/// (`builder.register_type("Point", |h| h.with_create(...).with_encode(...))`)
/// instead of hand-assembling `ObjectType::new` and feeding it to
/// `TypeRegistry::register` one statement at a time.
#[derive(Default)]
pub struct TypeRegistryBuilder {
    registry: TypeRegistry,
}

impl TypeRegistryBuilder {
    /// Start with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe and register a type under a string header — the overwhelming
    /// common case. `configure` receives a fresh [`ObjectType`] for `header`
    /// and returns it wired up with whichever of `with_create`/`with_complete`/
    /// `with_atomic_build`/`with_encode` it needs.
    #[must_use]
    pub fn register_type(
        mut self,
        header: impl Into<String>,
        configure: impl FnOnce(ObjectType) -> ObjectType,
    ) -> Self {
        let descriptor = configure(ObjectType::new(HeaderKey::Str(header.into())));
        self.registry.register(descriptor);
        self
    }

    /// Describe and register a type under an arbitrary (non-string) header
    /// value, decoded once into an arena so it can be projected to an owned
    /// [`HeaderKey`].
    ///
    /// Returns `None` if `header` has no owned projection (objects and
    /// natives cannot be header values).
    #[must_use]
    pub fn register_type_with_header(
        mut self,
        header: &Variant<'_>,
        configure: impl FnOnce(ObjectType) -> ObjectType,
    ) -> Option<Self> {
        let key = HeaderKey::from_variant(header)?;
        let descriptor = configure(ObjectType::new(key));
        self.registry.register(descriptor);
        Some(self)
    }

    /// Finish building, yielding the assembled [`TypeRegistry`].
    #[must_use]
    pub fn build(self) -> TypeRegistry {
        self.registry
    }
}

/// Describe an atomic type: no forward-reference support, built in one step
/// once its payload map is fully decoded.
///
/// A thin convenience over [`ObjectType::with_atomic_build`] +
/// [`ObjectType::with_encode`] for the common case where both callbacks
/// close over the same conversion functions.
pub fn atomic_type<T: 'static>(
    descriptor: ObjectType,
    build: impl for<'a> Fn(ObjectRef<'a>, &'a Arena) -> T + 'static,
    encode: impl for<'a> Fn(&T, &'a Arena) -> Variant<'a> + 'static,
) -> ObjectType {
    descriptor
        .with_atomic_build(move |object, arena| Box::new(build(object, arena)) as Box<dyn Any>)
        .with_encode(move |any, arena| {
            any.downcast_ref::<T>()
                .map_or(Variant::Null, |value| encode(value, arena))
        })
}

/// Describe a cycle-capable type: a placeholder is created before its
/// payload is decoded so self- and mutually-referential graphs can target it
/// mid-decode, then completed once the payload map is available.
pub fn cyclic_type<T: 'static>(
    descriptor: ObjectType,
    create: impl for<'a> Fn(&'a Arena) -> T + 'static,
    complete: impl for<'a> Fn(&mut T, ObjectRef<'a>, &'a Arena) + 'static,
    encode: impl for<'a> Fn(&T, &'a Arena) -> Variant<'a> + 'static,
) -> ObjectType {
    descriptor
        .with_create(move |arena| Box::new(create(arena)) as Box<dyn Any>)
        .with_complete(move |any, object, arena| {
            if let Some(value) = any.downcast_mut::<T>() {
                complete(value, object, arena);
            }
        })
        .with_encode(move |any, arena| {
            any.downcast_ref::<T>()
                .map_or(Variant::Null, |value| encode(value, arena))
        })
}

/// Register an arena-bound destructor for a native value, mirroring the
/// "Arena-bound destruction" contract (§4.3): `destructor` runs, LIFO with
/// every other registered destructor, when the owning [`Arena`] is dropped.
///
/// This is a direct pass-through to [`Arena::on_drop`] kept in this crate so
/// marshalling code that registers a native value and its teardown in the
/// same place doesn't need to name `plankton_core::Arena` directly.
pub fn on_native_drop(arena: &Arena, destructor: impl FnOnce() + 'static) {
    arena.on_drop(destructor);
}

/// Bind a [`Rc<ObjectType>`] descriptor to a concrete Rust type `T`, giving
/// callers a typed downcast without repeating the descriptor at every call
/// site. Pointer-identity gated, mirroring `ConcreteObjectType<T>::cast` in
/// `marshal.hh` — no RTTI, just `Rc::ptr_eq` plus `Any::downcast_ref`.
pub struct TypedDescriptor<T> {
    descriptor: Rc<ObjectType>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: 'static> TypedDescriptor<T> {
    /// Wrap an already-registered descriptor for typed downcasting.
    #[must_use]
    pub fn new(descriptor: Rc<ObjectType>) -> Self {
        Self {
            descriptor,
            _marker: std::marker::PhantomData,
        }
    }

    /// The wrapped descriptor, as registered.
    #[must_use]
    pub fn descriptor(&self) -> &Rc<ObjectType> {
        &self.descriptor
    }

    /// Borrow `native`'s payload as `&T`, if `native` was built from this
    /// exact descriptor.
    pub fn downcast<'a, R>(
        &self,
        native: plankton_core::NativeRef<'a>,
        f: impl FnOnce(&T) -> R,
    ) -> Option<R> {
        native.downcast_ref(&self.descriptor, f)
    }

    /// Mutably borrow `native`'s payload as `&mut T`, if `native` was built
    /// from this exact descriptor.
    pub fn downcast_mut<'a, R>(
        &self,
        native: plankton_core::NativeRef<'a>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        native.downcast_mut(&self.descriptor, f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use plankton_binary::{BinaryReader, BinaryWriter};

    struct Point {
        x: i64,
        y: i64,
    }

    fn point_type() -> ObjectType {
        atomic_type::<Point>(
            ObjectType::new(HeaderKey::Str("Point".to_string())),
            |object, _arena| {
                let payload = object.payload();
                let x = payload.get(&Variant::Integer(0)).and_then(|v| v.as_integer()).unwrap_or(0);
                let y = payload.get(&Variant::Integer(1)).and_then(|v| v.as_integer()).unwrap_or(0);
                Point { x, y }
            },
            |point, arena| {
                let payload = arena.new_map();
                let map = payload.as_map().unwrap();
                map.set(Variant::Integer(0), Variant::Integer(point.x)).unwrap();
                map.set(Variant::Integer(1), Variant::Integer(point.y)).unwrap();
                map.freeze();
                arena.new_object_with_payload(arena.new_string("Point"), payload)
            },
        )
    }

    #[test]
    fn atomic_native_round_trips_through_binary_codec() {
        let encode_arena = Arena::new();
        let payload = encode_arena.new_map();
        let map = payload.as_map().unwrap();
        map.set(Variant::Integer(0), Variant::Integer(3)).unwrap();
        map.set(Variant::Integer(1), Variant::Integer(4)).unwrap();
        map.freeze();
        let seed = encode_arena.new_object_with_payload(encode_arena.new_string("Point"), payload);

        let registry = TypeRegistryBuilder::new()
            .register_type("Point", |_| point_type())
            .build();

        let decode_arena = Arena::new();
        let wire = BinaryWriter::new().write(seed);
        let reader = BinaryReader::new(&decode_arena).with_registry(&registry);
        let decoded = reader.parse(&wire).unwrap();

        let native = decoded.as_native().expect("Point decodes to a native value");
        let descriptor = native.descriptor();
        let (x, y) = native
            .downcast_ref::<Point, _>(&descriptor, |p| (p.x, p.y))
            .expect("descriptor matches Point");
        assert_eq!((x, y), (3, 4));

        let reencoded = BinaryWriter::new().write(decoded);
        let reparse_arena = Arena::new();
        let reparsed = BinaryReader::new(&reparse_arena).parse(&reencoded).unwrap();
        let object = reparsed.as_object().expect("re-encodes to a generic seed without a registry");
        assert_eq!(object.payload().len(), 2);
    }

    #[test]
    fn unregistered_header_falls_back_to_generic_object() {
        let arena = Arena::new();
        let payload = arena.new_map();
        payload.as_map().unwrap().freeze();
        let seed = arena.new_object_with_payload(arena.new_string("Unknown"), payload);

        let registry = TypeRegistryBuilder::new()
            .register_type("Point", |_| point_type())
            .build();

        let wire = BinaryWriter::new().write(seed);
        let decode_arena = Arena::new();
        let decoded = BinaryReader::new(&decode_arena)
            .with_registry(&registry)
            .parse(&wire)
            .unwrap();
        assert!(decoded.as_object().is_some());
    }

    #[test]
    fn typed_descriptor_rejects_mismatched_native() {
        let registry = TypeRegistryBuilder::new()
            .register_type("Point", |_| point_type())
            .build();
        let other = TypeRegistryBuilder::new().register_type("Other", |h| {
            atomic_type::<u8>(h, |_, _| 0u8, |_, arena| arena.new_string("other"))
        });
        let other_registry = other.build();

        let arena = Arena::new();
        let payload = arena.new_map();
        payload.as_map().unwrap().freeze();
        let seed = arena.new_object_with_payload(arena.new_string("Point"), payload);
        let wire = BinaryWriter::new().write(seed);

        let point_arena = Arena::new();
        let decoded = BinaryReader::new(&point_arena)
            .with_registry(&registry)
            .parse(&wire)
            .unwrap();
        let native = decoded.as_native().unwrap();

        let other_payload = arena.new_map();
        other_payload.as_map().unwrap().freeze();
        let other_seed = arena.new_object_with_payload(arena.new_string("Other"), other_payload);
        let other_wire = BinaryWriter::new().write(other_seed);
        let mismatched_arena = Arena::new();
        let other_decoded = BinaryReader::new(&mismatched_arena)
            .with_registry(&other_registry)
            .parse(&other_wire)
            .unwrap();
        let other_native = other_decoded.as_native().unwrap();

        let typed = TypedDescriptor::<Point>::new(native.descriptor());
        assert!(typed.downcast(native, |p| p.x).is_some());
        assert!(typed.downcast(other_native, |p| p.x).is_none());
    }

    #[test]
    fn on_native_drop_runs_lifo_when_arena_drops() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let order: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let arena = Arena::new();
            let first = Rc::clone(&order);
            on_native_drop(&arena, move || first.borrow_mut().push(1));
            let second = Rc::clone(&order);
            on_native_drop(&arena, move || second.borrow_mut().push(2));
        }
        assert_eq!(*order.borrow(), vec![2, 1]);
    }
}
