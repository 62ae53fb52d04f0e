#![forbid(unsafe_code)]

//! Record schemas for immutable write targets.
//!
//! A record-mode binder never mutates an existing value. Instead, a
//! [`RecordSchema`] lists the record's named, typed components and carries a
//! constructor closure; `write_record` collects every component's converted
//! value into a [`RecordComponents`] bag and invokes the constructor once
//! everything validates.

use std::any::{TypeId, type_name};

use ahash::AHashMap;

use bindery_core::DynValue;

pub(crate) struct RecordComponent {
    pub(crate) name: String,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
}

/// The shape of a record type `R`: its named components and how to construct
/// an `R` from their values.
pub struct RecordSchema<R> {
    components: Vec<RecordComponent>,
    construct: Box<dyn Fn(&RecordComponents) -> R>,
}

impl<R> RecordSchema<R> {
    /// Start a schema with its constructor. Components are declared with
    /// [`component`](Self::component); the constructor reads each one back
    /// via [`RecordComponents::get`].
    #[must_use]
    pub fn new(construct: impl Fn(&RecordComponents) -> R + 'static) -> Self {
        Self {
            components: Vec::new(),
            construct: Box::new(construct),
        }
    }

    /// Declare a component with its name and value type.
    ///
    /// # Panics
    ///
    /// On a duplicate component name.
    #[must_use]
    pub fn component<T: Clone + PartialEq + 'static>(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(
            !self.components.iter().any(|c| c.name == name),
            "duplicate record component '{name}'"
        );
        self.components.push(RecordComponent {
            name,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        });
        self
    }

    pub(crate) fn components(&self) -> &[RecordComponent] {
        &self.components
    }

    pub(crate) fn component_named(&self, name: &str) -> Option<&RecordComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    pub(crate) fn construct(&self, components: &RecordComponents) -> R {
        (self.construct)(components)
    }
}

/// Converted component values handed to a schema's constructor.
pub struct RecordComponents {
    values: AHashMap<String, DynValue>,
}

impl RecordComponents {
    pub(crate) fn new(values: AHashMap<String, DynValue>) -> Self {
        Self { values }
    }

    /// The value of component `name`.
    ///
    /// # Panics
    ///
    /// On an unknown name or a wrong type. Neither can happen from inside
    /// `write_record`: component presence and types are checked when the
    /// bindings complete and again before construction.
    #[must_use]
    pub fn get<T: Clone + 'static>(&self, name: &str) -> T {
        self.values
            .get(name)
            .and_then(DynValue::get::<T>)
            .unwrap_or_else(|| panic!("record component '{name}' missing or of the wrong type"))
    }

    pub(crate) fn raw(&self, name: &str) -> Option<&DynValue> {
        self.values.get(name)
    }
}
