#![forbid(unsafe_code)]

//! Type-erased values for property accessor tables.
//!
//! Rust has no runtime reflection, so property definitions carry their value
//! through a [`DynValue`]: an `Rc<dyn Any>` paired with an equality closure
//! captured at construction, where the concrete type is still known. This
//! keeps `PartialEq` (needed for change detection and convert-back checks)
//! working across the erasure boundary.
//!
//! # Invariants
//!
//! 1. Two `DynValue`s compare equal iff they hold the same concrete type and
//!    the typed values compare equal.
//! 2. `get::<T>()` returns `Some` only for the exact stored type.

use std::any::{Any, TypeId, type_name};
use std::rc::Rc;

/// A cloneable, comparable, type-erased value.
#[derive(Clone)]
pub struct DynValue {
    value: Rc<dyn Any>,
    eq: Rc<dyn Fn(&dyn Any, &dyn Any) -> bool>,
    type_name: &'static str,
}

impl DynValue {
    /// Erase a typed value.
    #[must_use]
    pub fn new<T: Clone + PartialEq + 'static>(value: T) -> Self {
        Self {
            value: Rc::new(value),
            eq: Rc::new(|a, b| {
                match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }),
            type_name: type_name::<T>(),
        }
    }

    /// Recover the typed value, cloning it out. `None` on type mismatch.
    #[must_use]
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }

    /// The `TypeId` of the stored value.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        (*self.value).type_id()
    }

    /// The type name of the stored value, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for DynValue {
    fn eq(&self, other: &Self) -> bool {
        (self.eq)(&*self.value, &*other.value)
    }
}

impl std::fmt::Debug for DynValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynValue")
            .field("type", &self.type_name)
            .finish()
    }
}
