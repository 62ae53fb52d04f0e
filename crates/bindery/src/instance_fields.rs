#![forbid(unsafe_code)]

//! Bulk binding of form fields to properties by name.
//!
//! `bind_instance_fields` is the counterpart of scanning a form object:
//! each [`InstanceField`] names a field, and the binder matches those names
//! against its property set (case-insensitively, ignoring underscores),
//! bridging presentation and model types through the [`ConverterFactory`]
//! when they differ. Fields that match nothing are skipped; a matched field
//! whose types cannot be bridged fails loudly.
//!
//! # Failure Modes
//!
//! - A matched field with no registered presentation/model bridge returns
//!   [`BinderError::IncompatibleTypes`].
//! - An explicit property override that does not resolve returns
//!   [`BinderError::Property`].
//! - If the pass binds nothing and the binder has no bindings at all,
//!   [`BinderError::NoInstanceFields`] flags the silently-useless call.

use std::any::{Any, TypeId, type_name};
use std::marker::PhantomData;
use std::rc::Rc;

use ahash::AHashMap;

use bindery_core::{
    ConversionResult, Converter, DynValue, Field, FieldId, StringToBool, StringToNumber,
    ValueContext,
};
use bindery_props::PropertyDefinition;

use crate::binder::Binder;
use crate::status::BinderError;

// ---------------------------------------------------------------------------
// Converter factory
// ---------------------------------------------------------------------------

/// Wraps a typed converter so its model side is a [`DynValue`], letting the
/// binding chain end at the erased property boundary.
struct ErasedModel<C, M> {
    inner: C,
    _model: PhantomData<fn() -> M>,
}

impl<P, M, C> Converter<P, DynValue> for ErasedModel<C, M>
where
    M: Clone + PartialEq + 'static,
    C: Converter<P, M>,
{
    fn to_model(&self, value: P, ctx: &ValueContext) -> ConversionResult<DynValue> {
        self.inner.to_model(value, ctx).map(DynValue::new)
    }

    fn to_presentation(&self, value: DynValue, ctx: &ValueContext) -> P {
        let model = value
            .get::<M>()
            .expect("bridged model value type verified at bind time");
        self.inner.to_presentation(model, ctx)
    }
}

/// Identity bridge for fields whose presentation type already matches the
/// property's model type.
struct SameType<P> {
    _value: PhantomData<fn() -> P>,
}

impl<P: Clone + PartialEq + 'static> Converter<P, DynValue> for SameType<P> {
    fn to_model(&self, value: P, _ctx: &ValueContext) -> ConversionResult<DynValue> {
        Ok(DynValue::new(value))
    }

    fn to_presentation(&self, value: DynValue, _ctx: &ValueContext) -> P {
        value
            .get::<P>()
            .expect("bridged model value type verified at bind time")
    }
}

/// Registry of presentation-to-model bridges keyed by type pair, consulted
/// when instance fields bind to properties of a different value type.
///
/// Seeded with string-to-number and string-to-bool bridges; register more
/// with [`register`](Self::register) (a later registration for the same pair
/// replaces the earlier one).
pub struct ConverterFactory {
    bridges: AHashMap<(TypeId, TypeId), Box<dyn Any>>,
}

impl ConverterFactory {
    /// An empty factory. Only same-type bindings will bridge.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bridges: AHashMap::new(),
        }
    }

    /// A factory with the stock string bridges: `String` fields to `i32`,
    /// `i64`, `f64`, and `bool` properties.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register(StringToNumber::<i32>::new("must be a whole number"));
        factory.register(StringToNumber::<i64>::new("must be a whole number"));
        factory.register(StringToNumber::<f64>::new("must be a number"));
        factory.register(StringToBool::new("must be true or false"));
        factory
    }

    /// Register a bridge from presentation type `P` to model type `M`.
    pub fn register<P, M>(&mut self, converter: impl Converter<P, M> + 'static)
    where
        P: 'static,
        M: Clone + PartialEq + 'static,
    {
        let bridge: Rc<dyn Converter<P, DynValue>> = Rc::new(ErasedModel {
            inner: converter,
            _model: PhantomData::<fn() -> M>,
        });
        self.bridges
            .insert((TypeId::of::<P>(), TypeId::of::<M>()), Box::new(bridge));
    }

    /// The bridge from presentation type `P` to the model type identified by
    /// `model`, if one exists.
    pub(crate) fn bridge<P: Clone + PartialEq + 'static>(
        &self,
        model: TypeId,
    ) -> Option<Rc<dyn Converter<P, DynValue>>> {
        if model == TypeId::of::<P>() {
            return Some(Rc::new(SameType::<P> { _value: PhantomData }));
        }
        self.bridges
            .get(&(TypeId::of::<P>(), model))
            .and_then(|b| b.downcast_ref::<Rc<dyn Converter<P, DynValue>>>())
            .cloned()
    }
}

impl Default for ConverterFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ---------------------------------------------------------------------------
// Instance fields
// ---------------------------------------------------------------------------

/// One named field offered to [`Binder::bind_instance_fields`].
///
/// The completion closure is built where the concrete field type is still
/// known; by the time the binder runs it, only the property definition is
/// needed.
pub struct InstanceField<B: 'static> {
    name: String,
    property_override: Option<String>,
    field_id: FieldId,
    complete: Box<dyn Fn(&Binder<B>, &Rc<PropertyDefinition<B>>) -> Result<(), BinderError>>,
}

impl<B: 'static> InstanceField<B> {
    /// Offer `field` under `name` for property matching.
    #[must_use]
    pub fn new<F: Field + Clone>(name: impl Into<String>, field: &F) -> Self {
        let handle = field.clone();
        let complete = Box::new(
            move |binder: &Binder<B>, definition: &Rc<PropertyDefinition<B>>| {
                let Some(bridge) = binder.bridge::<F::Value>(definition.value_type()) else {
                    return Err(BinderError::IncompatibleTypes {
                        property: definition.name().to_owned(),
                        presentation: type_name::<F::Value>(),
                        model: definition.value_type_name(),
                    });
                };
                let _binding = binder
                    .for_field(&handle)
                    .with_converter(bridge)
                    .bind_erased(Rc::clone(definition));
                Ok(())
            },
        );
        Self {
            name: name.into(),
            property_override: None,
            field_id: field.id(),
            complete,
        }
    }

    /// Target an explicit property name instead of matching on the field's
    /// own name. Unlike name matching, an override that does not resolve is
    /// an error.
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property_override = Some(property.into());
        self
    }
}

/// Case-insensitive, underscore-insensitive name form used for matching.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl<B: 'static> Binder<B> {
    /// Register a presentation/model bridge on this binder's factory,
    /// replacing any stock bridge for the same type pair.
    pub fn register_converter<P, M>(&self, converter: impl Converter<P, M> + 'static)
    where
        P: 'static,
        M: Clone + PartialEq + 'static,
    {
        self.inner.borrow_mut().converters.register(converter);
    }

    pub(crate) fn bridge<P: Clone + PartialEq + 'static>(
        &self,
        model: TypeId,
    ) -> Option<Rc<dyn Converter<P, DynValue>>> {
        self.inner.borrow().converters.bridge::<P>(model)
    }

    /// Bind each offered field to the property whose name matches, skipping
    /// fields that are already bound or match nothing. Returns the number of
    /// bindings made.
    ///
    /// # Errors
    ///
    /// See the module-level failure modes.
    ///
    /// # Panics
    ///
    /// When the binder was created without a property set.
    pub fn bind_instance_fields(
        &self,
        fields: impl IntoIterator<Item = InstanceField<B>>,
    ) -> Result<usize, BinderError> {
        let set = self
            .inner
            .borrow()
            .property_set
            .clone()
            .expect("bind_instance_fields requires a Binder created with a property set");
        let names = set.property_names();

        let mut bound = 0;
        for field in fields {
            let already_bound = self
                .inner
                .borrow()
                .bindings
                .iter()
                .any(|b| b.field_id() == field.field_id);
            if already_bound {
                tracing::trace!(field = %field.name, "skipping already-bound instance field");
                continue;
            }
            let definition = match &field.property_override {
                Some(property) => set.resolve(property)?,
                None => {
                    let wanted = normalize(&field.name);
                    let Some(matched) = names.iter().find(|n| normalize(n) == wanted) else {
                        tracing::trace!(
                            field = %field.name,
                            "no property matches instance field, skipping"
                        );
                        continue;
                    };
                    set.resolve(matched)?
                }
            };
            (field.complete)(self, &definition)?;
            bound += 1;
        }
        tracing::debug!(bound, "instance fields bound");

        if !self.inner.borrow().ever_bound {
            return Err(BinderError::NoInstanceFields);
        }
        Ok(bound)
    }
}
