#![forbid(unsafe_code)]

//! Property tables with lazy dotted-path expansion.
//!
//! A [`PropertySet`] is built once per bean type from explicit accessor
//! registrations, then queried by name. Dotted paths ("address.street")
//! compose the parent's accessors with the child set's on first resolution
//! and are cached in place; the engine is single-threaded, so the cache is a
//! plain `RefCell` map.
//!
//! # Invariants
//!
//! 1. Resolving the same name twice returns the structurally shared
//!    definition.
//! 2. A composed dotted definition is writable iff both the parent property
//!    and the child property are writable.
//! 3. Resolution failures report the furthest resolvable prefix of a dotted
//!    path.

use std::any::{TypeId, type_name};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use bindery_core::DynValue;

use crate::definition::{PropertyDefinition, PropertyError};

/// Options controlling dotted-path resolution, part of the registry cache
/// key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanOptions {
    /// Whether dotted nested paths resolve at all.
    pub nested: bool,
    /// Maximum number of path segments a dotted name may have.
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            nested: true,
            max_depth: 8,
        }
    }
}

type NestedResolver<B> = Rc<dyn Fn(&str) -> Result<Rc<PropertyDefinition<B>>, PropertyError>>;

/// The property table of one bean type `B`.
pub struct PropertySet<B> {
    type_name: &'static str,
    options: ScanOptions,
    direct: RefCell<AHashMap<String, Rc<PropertyDefinition<B>>>>,
    nested: AHashMap<String, NestedResolver<B>>,
    order: Vec<String>,
}

impl<B: 'static> PropertySet<B> {
    /// Start building a set with default [`ScanOptions`].
    #[must_use]
    pub fn builder() -> PropertySetBuilder<B> {
        PropertySetBuilder::new()
    }

    /// The bean type's name, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The options this set was built with.
    #[must_use]
    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Top-level property names in registration order.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Resolve a (possibly dotted) property name.
    ///
    /// Dotted definitions materialize on first resolution and are cached;
    /// repeated calls return the shared instance.
    ///
    /// # Errors
    ///
    /// [`PropertyError::NotFound`] for unknown names (reporting the furthest
    /// resolvable prefix of a dotted path) and [`PropertyError::TooDeep`]
    /// when a path exceeds `max_depth`.
    pub fn resolve(&self, name: &str) -> Result<Rc<PropertyDefinition<B>>, PropertyError> {
        if let Some(def) = self.direct.borrow().get(name) {
            return Ok(Rc::clone(def));
        }
        if let Some((head, rest)) = name.split_once('.') {
            if !self.options.nested {
                return Err(PropertyError::NotFound {
                    name: name.to_owned(),
                    resolved_prefix: None,
                });
            }
            if name.split('.').count() > self.options.max_depth {
                return Err(PropertyError::TooDeep {
                    name: name.to_owned(),
                    max_depth: self.options.max_depth,
                });
            }
            let Some(resolver) = self.nested.get(head) else {
                let resolved_prefix = self
                    .direct
                    .borrow()
                    .contains_key(head)
                    .then(|| head.to_owned());
                return Err(PropertyError::NotFound {
                    name: name.to_owned(),
                    resolved_prefix,
                });
            };
            let def = resolver(rest)?;
            tracing::trace!(property = name, "materialized nested property definition");
            self.direct
                .borrow_mut()
                .insert(name.to_owned(), Rc::clone(&def));
            return Ok(def);
        }
        Err(PropertyError::NotFound {
            name: name.to_owned(),
            resolved_prefix: None,
        })
    }
}

impl<B> fmt::Debug for PropertySet<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySet")
            .field("type", &self.type_name)
            .field("properties", &self.order)
            .field("options", &self.options)
            .finish()
    }
}

/// Accumulates property registrations for a bean type `B`.
pub struct PropertySetBuilder<B: 'static> {
    options: ScanOptions,
    direct: AHashMap<String, Rc<PropertyDefinition<B>>>,
    nested: AHashMap<String, NestedResolver<B>>,
    order: Vec<String>,
}

impl<B: 'static> PropertySetBuilder<B> {
    /// A builder with default [`ScanOptions`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ScanOptions::default())
    }

    /// A builder with explicit options.
    #[must_use]
    pub fn with_options(options: ScanOptions) -> Self {
        Self {
            options,
            direct: AHashMap::new(),
            nested: AHashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert_definition<M: Clone + PartialEq + 'static>(
        &mut self,
        name: &str,
        getter: Rc<dyn Fn(&B) -> DynValue>,
        setter: Option<Rc<dyn Fn(&mut B, DynValue)>>,
    ) {
        assert!(
            !name.contains('.'),
            "property name '{name}' must not contain '.'; register a nested set instead"
        );
        assert!(
            !self.direct.contains_key(name),
            "duplicate property '{name}'"
        );
        let def = PropertyDefinition::new(
            name.to_owned(),
            None,
            TypeId::of::<M>(),
            type_name::<M>(),
            getter,
            setter,
        );
        self.direct.insert(name.to_owned(), Rc::new(def));
        self.order.push(name.to_owned());
    }

    /// Register a writable property.
    ///
    /// # Panics
    ///
    /// On a duplicate or dotted name.
    pub fn property<M: Clone + PartialEq + 'static>(
        &mut self,
        name: &str,
        get: impl Fn(&B) -> M + 'static,
        set: impl Fn(&mut B, M) + 'static,
    ) -> &mut Self {
        let getter: Rc<dyn Fn(&B) -> DynValue> = Rc::new(move |bean| DynValue::new(get(bean)));
        let setter: Rc<dyn Fn(&mut B, DynValue)> = Rc::new(move |bean, value| {
            if let Some(value) = value.get::<M>() {
                set(bean, value);
            }
        });
        self.insert_definition::<M>(name, getter, Some(setter));
        self
    }

    /// Register a read-only property. Bindings to it can never be writable.
    ///
    /// # Panics
    ///
    /// On a duplicate or dotted name.
    pub fn read_only<M: Clone + PartialEq + 'static>(
        &mut self,
        name: &str,
        get: impl Fn(&B) -> M + 'static,
    ) -> &mut Self {
        let getter: Rc<dyn Fn(&B) -> DynValue> = Rc::new(move |bean| DynValue::new(get(bean)));
        self.insert_definition::<M>(name, getter, None);
        self
    }

    /// Register a nested property whose dotted children resolve through
    /// `child`. The nested root itself also becomes a bindable property of
    /// type `C`.
    ///
    /// # Panics
    ///
    /// On a duplicate or dotted name.
    pub fn nested<C: Clone + PartialEq + 'static>(
        &mut self,
        name: &str,
        get: impl Fn(&B) -> C + 'static,
        set: impl Fn(&mut B, C) + 'static,
        child: Rc<PropertySet<C>>,
    ) -> &mut Self {
        let get: Rc<dyn Fn(&B) -> C> = Rc::new(get);
        let set: Rc<dyn Fn(&mut B, C)> = Rc::new(set);

        let root_getter: Rc<dyn Fn(&B) -> DynValue> = {
            let get = Rc::clone(&get);
            Rc::new(move |bean| DynValue::new(get(bean)))
        };
        let root_setter: Rc<dyn Fn(&mut B, DynValue)> = {
            let set = Rc::clone(&set);
            Rc::new(move |bean, value| {
                if let Some(value) = value.get::<C>() {
                    set(bean, value);
                }
            })
        };
        self.insert_definition::<C>(name, root_getter, Some(root_setter));

        let head = name.to_owned();
        let resolver: NestedResolver<B> = Rc::new(move |rest| {
            let child_def = child
                .resolve(rest)
                .map_err(|err| prefix_child_error(&head, err))?;
            let full_name = format!("{head}.{}", child_def.name());
            let parent = Some(match child_def.parent_name() {
                None => head.clone(),
                Some(p) => format!("{head}.{p}"),
            });
            let getter: Rc<dyn Fn(&B) -> DynValue> = {
                let get = Rc::clone(&get);
                let child_def = Rc::clone(&child_def);
                Rc::new(move |bean| child_def.get(&get(bean)))
            };
            let setter: Option<Rc<dyn Fn(&mut B, DynValue)>> = if child_def.is_read_only() {
                None
            } else {
                let get = Rc::clone(&get);
                let set = Rc::clone(&set);
                let child_def = Rc::clone(&child_def);
                Some(Rc::new(move |bean: &mut B, value: DynValue| {
                    let mut child_value = get(bean);
                    if child_def.set(&mut child_value, value).is_ok() {
                        set(bean, child_value);
                    }
                }))
            };
            Ok(Rc::new(PropertyDefinition::new(
                full_name,
                parent,
                child_def.value_type(),
                child_def.value_type_name(),
                getter,
                setter,
            )))
        });
        self.nested.insert(name.to_owned(), resolver);
        self
    }

    /// Finish the table.
    #[must_use]
    pub fn build(self) -> PropertySet<B> {
        PropertySet {
            type_name: type_name::<B>(),
            options: self.options,
            direct: RefCell::new(self.direct),
            nested: self.nested,
            order: self.order,
        }
    }
}

impl<B: 'static> Default for PropertySetBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}

fn prefix_child_error(head: &str, err: PropertyError) -> PropertyError {
    match err {
        PropertyError::NotFound {
            name,
            resolved_prefix,
        } => PropertyError::NotFound {
            name: format!("{head}.{name}"),
            resolved_prefix: Some(match resolved_prefix {
                None => head.to_owned(),
                Some(p) => format!("{head}.{p}"),
            }),
        },
        PropertyError::TooDeep { name, max_depth } => PropertyError::TooDeep {
            name: format!("{head}.{name}"),
            max_depth,
        },
        PropertyError::TypeMismatch {
            name,
            expected,
            actual,
        } => PropertyError::TypeMismatch {
            name: format!("{head}.{name}"),
            expected,
            actual,
        },
        PropertyError::ReadOnly { name } => PropertyError::ReadOnly {
            name: format!("{head}.{name}"),
        },
    }
}
