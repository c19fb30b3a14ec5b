//! Lookup of [`ObjectType`] descriptors by header value.

use std::collections::HashMap;
use std::rc::Rc;

use crate::object_type::{HeaderKey, ObjectType, OwnedVariant};
use crate::variant::Variant;

/// Maps object headers to the [`ObjectType`] descriptor that reconstructs
/// them.
///
/// String headers — the overwhelming common case — resolve in a hash map;
/// any other header shape falls back to a short linear scan, mirroring the
/// split the original marshalling layer makes between its fast string
/// sub-map and its generic fallback list.
#[derive(Default)]
pub struct TypeRegistry {
    by_string: HashMap<String, Rc<ObjectType>>,
    fallback: Vec<(OwnedVariant, Rc<ObjectType>)>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor`. A later registration for the same header
    /// replaces an earlier one.
    pub fn register(&mut self, descriptor: ObjectType) {
        let descriptor = Rc::new(descriptor);
        match descriptor.header().clone() {
            HeaderKey::Str(s) => {
                self.by_string.insert(s, descriptor);
            }
            HeaderKey::Other(owned) => {
                if let Some(slot) = self.fallback.iter_mut().find(|(k, _)| *k == owned) {
                    slot.1 = descriptor;
                } else {
                    self.fallback.push((owned, descriptor));
                }
            }
        }
    }

    /// Look up the descriptor registered for `header`, if any.
    #[must_use]
    pub fn lookup(&self, header: &Variant<'_>) -> Option<Rc<ObjectType>> {
        if let Variant::String(s) = header {
            return self.by_string.get(&s.to_str_lossy()).cloned();
        }
        let owned = OwnedVariant::from_variant(header)?;
        self.fallback
            .iter()
            .rev()
            .find(|(k, _)| *k == owned)
            .map(|(_, d)| Rc::clone(d))
    }

    /// Number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_string.len() + self.fallback.len()
    }

    /// `true` if no descriptors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
