#![forbid(unsafe_code)]

//! A single resolved property of a bean type.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use bindery_core::DynValue;

/// Errors from property resolution and access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// No property with this name. `resolved_prefix` names the furthest
    /// dotted prefix that did resolve, if any.
    NotFound {
        /// The requested (possibly dotted) property name.
        name: String,
        /// Furthest resolvable prefix of a dotted path.
        resolved_prefix: Option<String>,
    },
    /// The property exists but holds a different value type.
    TypeMismatch {
        /// The property name.
        name: String,
        /// The type the caller expected.
        expected: &'static str,
        /// The type the property actually holds.
        actual: &'static str,
    },
    /// The property has no setter.
    ReadOnly {
        /// The property name.
        name: String,
    },
    /// A dotted path exceeds the set's maximum nesting depth.
    TooDeep {
        /// The requested property name.
        name: String,
        /// The configured maximum segment count.
        max_depth: usize,
    },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound {
                name,
                resolved_prefix: Some(prefix),
            } => write!(f, "property '{name}' not found (resolved up to '{prefix}')"),
            Self::NotFound { name, .. } => write!(f, "property '{name}' not found"),
            Self::TypeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "property '{name}' holds {actual}, not the expected {expected}"
            ),
            Self::ReadOnly { name } => write!(f, "property '{name}' is read-only"),
            Self::TooDeep { name, max_depth } => write!(
                f,
                "property path '{name}' exceeds the maximum nesting depth of {max_depth}"
            ),
        }
    }
}

impl std::error::Error for PropertyError {}

/// A (possibly nested) named property of a bean type `B`.
///
/// The getter is always present; a missing setter marks the property
/// read-only, and it can then never be the target of a write.
pub struct PropertyDefinition<B> {
    name: String,
    parent: Option<String>,
    value_type: TypeId,
    value_type_name: &'static str,
    getter: Rc<dyn Fn(&B) -> DynValue>,
    setter: Option<Rc<dyn Fn(&mut B, DynValue)>>,
}

impl<B: 'static> PropertyDefinition<B> {
    pub(crate) fn new(
        name: String,
        parent: Option<String>,
        value_type: TypeId,
        value_type_name: &'static str,
        getter: Rc<dyn Fn(&B) -> DynValue>,
        setter: Option<Rc<dyn Fn(&mut B, DynValue)>>,
    ) -> Self {
        Self {
            name,
            parent,
            value_type,
            value_type_name,
            getter,
            setter,
        }
    }

    /// The full (dotted) property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full name of the parent property; `None` for top-level properties.
    #[must_use]
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// `TypeId` of the property's value type.
    #[must_use]
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    /// Human-readable name of the value type, for diagnostics.
    #[must_use]
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Whether the property lacks a setter.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// Read the property from `bean`.
    #[must_use]
    pub fn get(&self, bean: &B) -> DynValue {
        (self.getter)(bean)
    }

    /// Write `value` into `bean`.
    ///
    /// # Errors
    ///
    /// [`PropertyError::ReadOnly`] if the property has no setter, and
    /// [`PropertyError::TypeMismatch`] if the value's type differs from the
    /// property's.
    pub fn set(&self, bean: &mut B, value: DynValue) -> Result<(), PropertyError> {
        let Some(setter) = &self.setter else {
            return Err(PropertyError::ReadOnly {
                name: self.name.clone(),
            });
        };
        if value.type_id() != self.value_type {
            return Err(PropertyError::TypeMismatch {
                name: self.name.clone(),
                expected: self.value_type_name,
                actual: value.type_name(),
            });
        }
        setter(bean, value);
        Ok(())
    }
}

impl<B> fmt::Debug for PropertyDefinition<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("value_type", &self.value_type_name)
            .field("read_only", &self.setter.is_none())
            .finish()
    }
}
