//! Object type descriptors: the bridge between arena-owned [`Variant`]
//! trees and native Rust values.

use std::any::Any;

use crate::arena::Arena;
use crate::variant::{ObjectRef, Variant};

/// An owned, arena-free projection of a [`Variant`], used anywhere a value
/// needs to outlive the arena it was decoded from — chiefly as an
/// [`ObjectType`] header key.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedVariant {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Integer(i64),
    /// An opaque identifier.
    Id {
        /// Width of the identifier in bytes.
        size: u32,
        /// The identifier's value.
        value: u64,
    },
    /// An owned copy of a string's bytes.
    String(String),
    /// An owned copy of a blob's bytes.
    Blob(Vec<u8>),
    /// An owned copy of an array's elements.
    Array(Vec<OwnedVariant>),
    /// An owned copy of a map's entries.
    Map(Vec<(OwnedVariant, OwnedVariant)>),
}

impl OwnedVariant {
    /// Copy `value` out of its arena into an owned projection. Objects and
    /// natives have no owned representation and are rejected: headers are
    /// always scalars, strings, blobs, arrays or maps in practice.
    pub fn from_variant(value: &Variant<'_>) -> Option<OwnedVariant> {
        Some(match value {
            Variant::Null => OwnedVariant::Null,
            Variant::Bool(b) => OwnedVariant::Bool(*b),
            Variant::Integer(i) => OwnedVariant::Integer(*i),
            Variant::Id { size, value } => OwnedVariant::Id {
                size: *size,
                value: *value,
            },
            Variant::String(s) => OwnedVariant::String(s.to_str_lossy()),
            Variant::Blob(b) => OwnedVariant::Blob(b.to_vec()),
            Variant::Array(a) => {
                let mut items = Vec::with_capacity(a.len());
                for item in a.iter() {
                    items.push(OwnedVariant::from_variant(&item)?);
                }
                OwnedVariant::Array(items)
            }
            Variant::Map(m) => {
                let mut entries = Vec::with_capacity(m.len());
                for (k, v) in m.iter() {
                    entries.push((
                        OwnedVariant::from_variant(&k)?,
                        OwnedVariant::from_variant(&v)?,
                    ));
                }
                OwnedVariant::Map(entries)
            }
            Variant::Object(_) | Variant::Native(_) => return None,
        })
    }
}

/// The lookup key a [`crate::registry::TypeRegistry`] indexes descriptors
/// by. String headers get a fast hash-map path; any other header shape
/// falls back to linear scan.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderKey {
    /// A plain string header — the common case.
    Str(String),
    /// Any other header shape.
    Other(OwnedVariant),
}

impl HeaderKey {
    /// Project a decoded header value into a lookup key.
    #[must_use]
    pub fn from_variant(value: &Variant<'_>) -> Option<HeaderKey> {
        if let Variant::String(s) = value {
            return Some(HeaderKey::Str(s.to_str_lossy()));
        }
        OwnedVariant::from_variant(value).map(HeaderKey::Other)
    }
}

/// Describes how to reconstruct and re-encode a native object during
/// binary decode/encode.
///
/// `create` and `complete` are both `None` for an *atomic* type: its
/// payload is produced directly from the decoded field map rather than
/// built incrementally, and it cannot be the target of a forward
/// [`Variant`] reference while still under construction.
pub struct ObjectType {
    header: HeaderKey,
    #[allow(clippy::type_complexity)]
    create: Option<Box<dyn for<'a> Fn(&'a Arena) -> Box<dyn Any>>>,
    #[allow(clippy::type_complexity)]
    complete: Option<Box<dyn for<'a> Fn(&mut dyn Any, ObjectRef<'a>, &'a Arena)>>,
    #[allow(clippy::type_complexity)]
    atomic_build: Option<Box<dyn for<'a> Fn(ObjectRef<'a>, &'a Arena) -> Box<dyn Any>>>,
    #[allow(clippy::type_complexity)]
    encode: Option<Box<dyn for<'a> Fn(&dyn Any, &'a Arena) -> Variant<'a>>>,
}

impl ObjectType {
    /// Start describing a type identified by `header`.
    #[must_use]
    pub fn new(header: HeaderKey) -> Self {
        Self {
            header,
            create: None,
            complete: None,
            atomic_build: None,
            encode: None,
        }
    }

    /// The header this descriptor is registered under.
    #[must_use]
    pub fn header(&self) -> &HeaderKey {
        &self.header
    }

    /// Set the `create` callback: builds a placeholder native payload
    /// before the object's fields are decoded, so a forward reference can
    /// already target it. Mutually exclusive with [`ObjectType::with_atomic_build`].
    #[must_use]
    pub fn with_create(
        mut self,
        create: impl for<'a> Fn(&'a Arena) -> Box<dyn Any> + 'static,
    ) -> Self {
        self.create = Some(Box::new(create));
        self
    }

    /// Set the `complete` callback: populates the native payload once every
    /// field has been decoded into the object's payload map. Only used
    /// alongside [`ObjectType::with_create`].
    #[must_use]
    pub fn with_complete(
        mut self,
        complete: impl for<'a> Fn(&mut dyn Any, ObjectRef<'a>, &'a Arena) + 'static,
    ) -> Self {
        self.complete = Some(Box::new(complete));
        self
    }

    /// Set the atomic build callback: constructs the native payload in one
    /// step from the fully-decoded field map, with no placeholder phase.
    /// An atomic type cannot be the target of a reference that points back
    /// into its own still-decoding field list. Mutually exclusive with
    /// [`ObjectType::with_create`]/[`ObjectType::with_complete`].
    #[must_use]
    pub fn with_atomic_build(
        mut self,
        build: impl for<'a> Fn(ObjectRef<'a>, &'a Arena) -> Box<dyn Any> + 'static,
    ) -> Self {
        self.atomic_build = Some(Box::new(build));
        self
    }

    /// Set the `encode` callback: projects a native payload back into a
    /// `Variant` tree for the binary writer to emit.
    #[must_use]
    pub fn with_encode(
        mut self,
        encode: impl for<'a> Fn(&dyn Any, &'a Arena) -> Variant<'a> + 'static,
    ) -> Self {
        self.encode = Some(Box::new(encode));
        self
    }

    /// `true` if this type has no `create` callback — its native payload is
    /// built all at once from the decoded field map rather than
    /// incrementally, so it cannot be the target of a mid-decode forward
    /// reference.
    #[must_use]
    pub fn is_atomic(&self) -> bool {
        self.create.is_none()
    }

    /// Invoke the `create` callback, if set, producing a placeholder native
    /// payload before the object's fields have been read. Exposed beyond
    /// this crate so `plankton-binary`'s decoder can drive the two-phase
    /// reconstruction protocol.
    pub fn create(&self, arena: &Arena) -> Option<Box<dyn Any>> {
        self.create.as_ref().map(|f| f(arena))
    }

    /// Invoke the `complete` callback, if set, populating `payload` from the
    /// fully-decoded field map.
    pub fn complete<'a>(&self, payload: &mut dyn Any, object: ObjectRef<'a>, arena: &'a Arena) {
        if let Some(f) = &self.complete {
            f(payload, object, arena);
        }
    }

    /// Invoke the atomic build callback, if set, constructing the native
    /// payload in one step from the fully-decoded field map.
    pub fn build_atomic<'a>(&self, object: ObjectRef<'a>, arena: &'a Arena) -> Option<Box<dyn Any>> {
        self.atomic_build.as_ref().map(|f| f(object, arena))
    }

    /// `true` if this descriptor can reconstruct a native payload at all
    /// (via `create` or `atomic_build`). A descriptor with neither is only
    /// useful for encoding Rust values that were never decoded from the
    /// wire.
    #[must_use]
    pub fn can_decode(&self) -> bool {
        self.create.is_some() || self.atomic_build.is_some()
    }

    /// Invoke the `encode` callback, if set, projecting a native payload
    /// back into a seed `Variant` for the binary writer to emit. Yields
    /// `Variant::Null` if no `encode` callback was registered.
    pub fn encode<'a>(&self, payload: &dyn Any, arena: &'a Arena) -> Variant<'a> {
        self.encode
            .as_ref()
            .map_or(Variant::Null, |f| f(payload, arena))
    }
}

impl std::fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectType")
            .field("header", &self.header)
            .field("atomic", &self.is_atomic())
            .finish()
    }
}
