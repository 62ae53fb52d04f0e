#![forbid(unsafe_code)]

//! A single field-to-property binding and its builder.
//!
//! A binding owns the converter/validator chain between one field's
//! presentation value and one model value. The builder assembles the chain
//! stage by stage; every builder method consumes `self`, so a builder cannot
//! be completed twice. Completion registers the binding with its binder and
//! subscribes to the field's value changes.
//!
//! # Invariants
//!
//! 1. A completed binding stays registered until `unbind()` or until another
//!    binding completes on the same field.
//! 2. Programmatic field updates made by the binding itself (convert-back,
//!    `read_from`) never re-enter the change pipeline.
//! 3. A binding without a setter is read-only and can never be switched
//!    writable.
//!
//! # Failure Modes
//!
//! - `bind_property` fails when the name does not resolve or the model type
//!   differs from the property's value type.
//! - `bind_record_component` fails for names outside the record schema.

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use bindery_core::{
    Chained, ConversionResult, Converter, DynValue, Field, FieldId, NullRepresentationConverter,
    Subscription, ValidationResult, ValidatorStage, Validator, ValueContext, ValueError,
};
use bindery_props::PropertyDefinition;

use crate::binder::{BinderFlags, BinderInner};
use crate::status::{BinderError, BinderValidationStatus, BindingValidationStatus};

/// Global counter for unique binding IDs.
static BINDING_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

impl BindingId {
    pub(crate) fn next() -> Self {
        Self(BINDING_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Erased binding view used by the binder
// ---------------------------------------------------------------------------

/// Type-erased view of a completed binding, as the binder stores it.
///
/// Model values cross this boundary as [`DynValue`]; the concrete
/// `BindingInner` recovers the typed value on the other side.
pub(crate) trait BoundBinding<B> {
    fn id(&self) -> BindingId;
    fn field_id(&self) -> FieldId;
    fn property_name(&self) -> Option<String>;
    fn has_setter(&self) -> bool;
    fn is_read_only(&self) -> bool;
    fn force_read_only(&self, read_only: bool);

    /// Run the required check, the field's default validator, and the chain.
    /// `Some(value)` on success; the status carries every collected result.
    fn check(&self, flags: BinderFlags) -> (Option<DynValue>, BindingValidationStatus);

    /// The binding's current model value read from `bean`.
    fn current_model(&self, bean: &B) -> DynValue;

    /// Write `value` into `bean`, returning a closure that restores the
    /// previous value. `None` when the binding is read-only or setter-less.
    fn apply(&self, bean: &mut B, value: &DynValue) -> Option<Box<dyn FnOnce(&mut B)>>;

    /// After a successful commit: refresh the change-detection snapshot and
    /// push the normalized value back into the field if convert-back is on.
    fn post_write(&self, value: &DynValue);

    /// Load the field from `bean` without triggering the change pipeline.
    fn read_from(&self, bean: &B);

    /// Reset the field to its empty value and clear validation state.
    fn clear_field(&self);

    /// Whether the field's current value converts back to the snapshot taken
    /// at the last read/write. `None` when no comparison is possible (no
    /// snapshot, conversion failure, or change reversion not enabled).
    fn matches_initial(&self, flags: BinderFlags) -> Option<bool>;

    /// Route a status to the per-binding handler, or show/clear the field's
    /// invalid state by default.
    fn display_status(&self, status: &BindingValidationStatus);

    /// Drop the field subscription and stop reacting to changes.
    fn deactivate(&self);
}

// ---------------------------------------------------------------------------
// Concrete binding state
// ---------------------------------------------------------------------------

pub(crate) struct BindingInner<B: 'static, F: Field, M: Clone + PartialEq + 'static> {
    id: BindingId,
    field: F,
    label: Option<String>,
    property: Option<String>,
    chain: Box<dyn Converter<F::Value, M>>,
    getter: Rc<dyn Fn(&B) -> M>,
    setter: Option<Rc<dyn Fn(&mut B, M)>>,
    read_only: Cell<bool>,
    validators_disabled: Cell<bool>,
    required: Cell<bool>,
    required_message: Option<String>,
    /// `None` defers to the binder-wide default-validators flag.
    default_validator_enabled: Cell<Option<bool>>,
    convert_back: Cell<bool>,
    explicit_eq: Option<Rc<dyn Fn(&M, &M) -> bool>>,
    /// Model-value snapshot from the last read or successful write.
    initial: RefCell<Option<M>>,
    /// Re-entrancy guard around programmatic field updates.
    updating_field: Cell<bool>,
    subscription: RefCell<Option<Subscription>>,
    status_override: RefCell<Option<Rc<dyn Fn(&BindingValidationStatus)>>>,
    record_mode: bool,
    active: Cell<bool>,
}

impl<B: 'static, F: Field, M: Clone + PartialEq + 'static> BindingInner<B, F, M> {
    fn effective_label(&self) -> Option<String> {
        self.label.clone().or_else(|| self.field.label())
    }

    fn base_context(&self) -> ValueContext {
        let mut ctx = ValueContext::new();
        if let Some(label) = self.effective_label() {
            ctx = ctx.with_label(label);
        }
        ctx
    }

    fn set_field_guarded(&self, value: F::Value) {
        self.updating_field.set(true);
        self.field.set_value(value);
        self.updating_field.set(false);
    }

    /// Full model-direction pass: required check, default validator, chain.
    fn convert(&self, flags: BinderFlags) -> (ConversionResult<M>, Vec<ValidationResult>) {
        let sink = Rc::new(RefCell::new(Vec::new()));
        let disabled = flags.validators_disabled || self.validators_disabled.get();
        let ctx = self
            .base_context()
            .with_validators_disabled(disabled)
            .with_sink(Rc::clone(&sink));
        let value = self.field.value();

        if !disabled {
            if self.required.get() && value == self.field.empty_value() {
                let message = self
                    .required_message
                    .clone()
                    .unwrap_or_else(|| "this field is required".to_owned());
                return (Err(ValueError::new(message)), sink.borrow().clone());
            }
            let run_default = self
                .default_validator_enabled
                .get()
                .unwrap_or(flags.default_validators_enabled);
            if run_default {
                if let Some(validator) = self.field.default_validator() {
                    let result = validator.validate(&value, &ctx);
                    match result.error_level() {
                        Some(level) if level.is_error() => {
                            let message = result
                                .message()
                                .unwrap_or("invalid value")
                                .to_owned();
                            return (
                                Err(ValueError::with_level(message, level)),
                                sink.borrow().clone(),
                            );
                        }
                        Some(_) => ctx.record(result),
                        None => {}
                    }
                }
            }
        }

        let outcome = self.chain.to_model(value, &ctx);
        let records = sink.borrow().clone();
        (outcome, records)
    }

    fn status_from(
        &self,
        outcome: &ConversionResult<M>,
        mut records: Vec<ValidationResult>,
    ) -> BindingValidationStatus {
        if let Err(err) = outcome {
            records.push(err.to_result());
        }
        BindingValidationStatus::new(self.id, self.field.id(), self.effective_label(), records)
    }

    fn models_equal(&self, a: &M, b: &M, flags: BinderFlags) -> Option<bool> {
        if let Some(eq) = &self.explicit_eq {
            Some(eq(a, b))
        } else if flags.change_detection {
            Some(a == b)
        } else {
            None
        }
    }
}

impl<B: 'static, F: Field, M: Clone + PartialEq + 'static> BoundBinding<B>
    for BindingInner<B, F, M>
{
    fn id(&self) -> BindingId {
        self.id
    }

    fn field_id(&self) -> FieldId {
        self.field.id()
    }

    fn property_name(&self) -> Option<String> {
        self.property.clone()
    }

    fn has_setter(&self) -> bool {
        self.setter.is_some() || self.record_mode
    }

    fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    fn force_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
        self.field.set_read_only(read_only);
    }

    fn check(&self, flags: BinderFlags) -> (Option<DynValue>, BindingValidationStatus) {
        let (outcome, records) = self.convert(flags);
        let status = self.status_from(&outcome, records);
        (outcome.ok().map(DynValue::new), status)
    }

    fn current_model(&self, bean: &B) -> DynValue {
        DynValue::new((self.getter)(bean))
    }

    fn apply(&self, bean: &mut B, value: &DynValue) -> Option<Box<dyn FnOnce(&mut B)>> {
        if self.read_only.get() {
            return None;
        }
        let setter = self.setter.clone()?;
        let model: M = value.get()?;
        let previous = (self.getter)(bean);
        setter(bean, model);
        let revert_setter = Rc::clone(&setter);
        Some(Box::new(move |b: &mut B| revert_setter(b, previous)))
    }

    fn post_write(&self, value: &DynValue) {
        let Some(model) = value.get::<M>() else {
            return;
        };
        *self.initial.borrow_mut() = Some(model.clone());
        if self.convert_back.get() {
            let presentation = self.chain.to_presentation(model, &self.base_context());
            if presentation != self.field.value() {
                self.set_field_guarded(presentation);
            }
        }
    }

    fn read_from(&self, bean: &B) {
        let model = (self.getter)(bean);
        let presentation = self.chain.to_presentation(model.clone(), &self.base_context());
        self.set_field_guarded(presentation);
        self.field.set_invalid(None);
        *self.initial.borrow_mut() = Some(model);
    }

    fn clear_field(&self) {
        self.set_field_guarded(self.field.empty_value());
        self.field.set_invalid(None);
        *self.initial.borrow_mut() = None;
    }

    fn matches_initial(&self, flags: BinderFlags) -> Option<bool> {
        let initial = self.initial.borrow().clone()?;
        let (outcome, _) = self.convert(flags);
        let current = outcome.ok()?;
        self.models_equal(&initial, &current, flags)
    }

    fn display_status(&self, status: &BindingValidationStatus) {
        if let Some(handler) = self.status_override.borrow().clone() {
            handler(status);
            return;
        }
        if status.is_error() {
            self.field
                .set_invalid(status.message().map(str::to_owned));
        } else {
            self.field.set_invalid(None);
        }
    }

    fn deactivate(&self) {
        self.active.set(false);
        self.subscription.borrow_mut().take();
    }
}

// ---------------------------------------------------------------------------
// Public binding handle
// ---------------------------------------------------------------------------

/// Handle to a completed binding.
///
/// The binder keeps the binding alive; dropping this handle does not unbind.
pub struct Binding<B: 'static, F: Field, M: Clone + PartialEq + 'static> {
    inner: Rc<BindingInner<B, F, M>>,
    binder: Weak<RefCell<BinderInner<B>>>,
}

impl<B: 'static, F: Field, M: Clone + PartialEq + 'static> Binding<B, F, M> {
    /// The binding's identity.
    #[must_use]
    pub fn id(&self) -> BindingId {
        self.inner.id
    }

    /// The bound property or record component name, if any.
    #[must_use]
    pub fn property_name(&self) -> Option<String> {
        self.inner.property.clone()
    }

    /// Whether the binding currently refuses writes.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.inner.read_only.get()
    }

    /// Toggle the binding's read-only state, mirroring it onto the field.
    ///
    /// # Errors
    ///
    /// [`BinderError::NoSetter`] when trying to make a setter-less binding
    /// writable.
    pub fn set_read_only(&self, read_only: bool) -> Result<(), BinderError> {
        if !read_only && self.inner.setter.is_none() && !self.inner.record_mode {
            return Err(BinderError::NoSetter {
                property: self.inner.property.clone(),
            });
        }
        self.inner.read_only.set(read_only);
        self.inner.field.set_read_only(read_only);
        Ok(())
    }

    /// Skip every validator stage of this binding (converters still run).
    pub fn set_validators_disabled(&self, disabled: bool) {
        self.inner.validators_disabled.set(disabled);
    }

    /// Whether this binding's validators are skipped.
    #[must_use]
    pub fn is_validators_disabled(&self) -> bool {
        self.inner.validators_disabled.get()
    }

    /// Toggle the required (non-empty) check and the field's indicator.
    pub fn set_as_required_enabled(&self, required: bool) {
        self.inner.required.set(required);
        self.inner.field.set_required_indicator_visible(required);
    }

    /// Override whether the field's own default validator runs for this
    /// binding. `None` defers to the binder-wide setting.
    pub fn set_default_validator_enabled(&self, enabled: Option<bool>) {
        self.inner.default_validator_enabled.set(enabled);
    }

    /// Toggle writing the normalized value back into the field after a
    /// successful commit.
    pub fn set_convert_back_to_presentation(&self, convert_back: bool) {
        self.inner.convert_back.set(convert_back);
    }

    /// Replace the default show-on-field error display for this binding.
    pub fn set_status_handler(&self, handler: Rc<dyn Fn(&BindingValidationStatus)>) {
        let mut current = self.inner.status_override.borrow_mut();
        if current.is_some() {
            tracing::warn!(
                binding = self.inner.id.raw(),
                "replacing an already-registered binding status handler"
            );
        }
        *current = Some(handler);
    }

    /// Validate this binding alone. With `fire`, the outcome is also routed
    /// to the binder's registered status handler, or to this binding's
    /// status display when no binder-wide handler exists.
    pub fn validate(&self, fire: bool) -> BindingValidationStatus {
        let binder = self.binder.upgrade();
        let flags = binder
            .as_ref()
            .map(|b| b.borrow().flags)
            .unwrap_or_default();
        let (_, status) = BoundBinding::check(&*self.inner, flags);
        if fire {
            // A binder-wide handler has full replacement authority, the same
            // as on every other validation path.
            let handler = binder.and_then(|b| b.borrow().status_handler.clone());
            if let Some(handler) = handler {
                handler(&BinderValidationStatus::new(
                    vec![status.clone()],
                    Vec::new(),
                ));
            } else {
                self.inner.display_status(&status);
            }
        }
        status
    }

    /// Re-read the field's value from `bean`, refreshing the snapshot.
    pub fn read(&self, bean: &B) {
        self.inner.read_from(bean);
    }

    /// Remove the binding from its binder and stop reacting to the field.
    pub fn unbind(&self) {
        if let Some(binder) = self.binder.upgrade() {
            let mut binder = binder.borrow_mut();
            binder.changed.remove(&self.inner.id.raw());
            binder.bindings.retain(|b| b.id() != self.inner.id);
        }
        self.inner.deactivate();
        tracing::debug!(binding = self.inner.id.raw(), "binding removed");
    }
}

impl<B: 'static, F: Field, M: Clone + PartialEq + 'static> std::fmt::Debug for Binding<B, F, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.inner.id.raw())
            .field("property", &self.inner.property)
            .field("read_only", &self.inner.read_only.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Step-by-step assembly of a binding's chain, ending in one of the `bind*`
/// completions.
///
/// Every method consumes the builder, so a chain is configured exactly once
/// and completed exactly once. Converter stages change the model type `M`;
/// an equality predicate must therefore be set after the last converter.
pub struct BindingBuilder<B: 'static, F: Field, M> {
    binder: Rc<RefCell<BinderInner<B>>>,
    field: F,
    chain: Box<dyn Converter<F::Value, M>>,
    label: Option<String>,
    required_message: Option<String>,
    default_validator_enabled: Option<bool>,
    convert_back: bool,
    explicit_eq: Option<Rc<dyn Fn(&M, &M) -> bool>>,
}

impl<B: 'static, F: Field + Clone, M: 'static> BindingBuilder<B, F, M> {
    pub(crate) fn start(
        binder: Rc<RefCell<BinderInner<B>>>,
        field: F,
        chain: Box<dyn Converter<F::Value, M>>,
    ) -> Self {
        Self {
            binder,
            field,
            chain,
            label: None,
            required_message: None,
            default_validator_enabled: None,
            convert_back: true,
            explicit_eq: None,
        }
    }

    /// Append a converter stage, changing the model type to `M2`.
    ///
    /// Drops any equality predicate set so far; set it after the last
    /// converter instead.
    #[must_use]
    pub fn with_converter<M2: 'static>(
        self,
        converter: impl Converter<M, M2> + 'static,
    ) -> BindingBuilder<B, F, M2> {
        BindingBuilder {
            binder: self.binder,
            field: self.field,
            chain: Box::new(Chained::new(self.chain, converter)),
            label: self.label,
            required_message: self.required_message,
            default_validator_enabled: self.default_validator_enabled,
            convert_back: self.convert_back,
            explicit_eq: None,
        }
    }

    /// Append a validator stage. The value flows through unchanged.
    #[must_use]
    pub fn with_validator(self, validator: impl Validator<M> + 'static) -> Self
    where
        M: Clone,
    {
        let chain: Box<dyn Converter<F::Value, M>> =
            Box::new(Chained::new(self.chain, ValidatorStage::new(validator)));
        Self { chain, ..self }
    }

    /// Map the empty-marker value `repr` to `None` and every other value to
    /// `Some`, changing the model type to `Option<M>`.
    #[must_use]
    pub fn with_null_representation(self, repr: M) -> BindingBuilder<B, F, Option<M>>
    where
        M: Clone + PartialEq,
    {
        self.with_converter(NullRepresentationConverter::new(repr))
    }

    /// Reject the field's empty value with `message` before anything else
    /// runs, and show the field's required indicator.
    #[must_use]
    pub fn as_required(mut self, message: impl Into<String>) -> Self {
        self.required_message = Some(message.into());
        self
    }

    /// Label used in error messages, overriding the field's own label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Custom model-value equality used by change reversion, replacing the
    /// binder-wide change-detection comparison.
    #[must_use]
    pub fn with_equality_predicate(mut self, eq: impl Fn(&M, &M) -> bool + 'static) -> Self {
        self.explicit_eq = Some(Rc::new(eq));
        self
    }

    /// Control whether a successful commit writes the normalized value back
    /// into the field. On by default.
    #[must_use]
    pub fn with_convert_back_to_presentation(mut self, convert_back: bool) -> Self {
        self.convert_back = convert_back;
        self
    }

    /// Override whether the field's default validator runs for this binding.
    #[must_use]
    pub fn with_default_validator_enabled(mut self, enabled: Option<bool>) -> Self {
        self.default_validator_enabled = enabled;
        self
    }
}

impl<B: 'static, F: Field + Clone, M: Clone + PartialEq + 'static> BindingBuilder<B, F, M> {
    /// Complete with explicit accessors.
    ///
    /// # Panics
    ///
    /// On a record-mode binder; complete with
    /// [`bind_record_component`](Self::bind_record_component) there.
    pub fn bind(
        self,
        getter: impl Fn(&B) -> M + 'static,
        setter: impl Fn(&mut B, M) + 'static,
    ) -> Binding<B, F, M> {
        self.complete(Rc::new(getter), Some(Rc::new(setter)), None, false)
    }

    /// Complete with a getter only. The binding is read-only and can never
    /// be made writable.
    ///
    /// # Panics
    ///
    /// On a record-mode binder.
    pub fn bind_read_only(self, getter: impl Fn(&B) -> M + 'static) -> Binding<B, F, M> {
        self.complete(Rc::new(getter), None, None, false)
    }

    /// Complete against a named property of the binder's property set.
    ///
    /// # Errors
    ///
    /// [`BinderError::Property`] when the name does not resolve or the
    /// property's value type is not `M`.
    ///
    /// # Panics
    ///
    /// When the binder was created without a property set.
    pub fn bind_property(self, name: &str) -> Result<Binding<B, F, M>, BinderError> {
        let set = self
            .binder
            .borrow()
            .property_set
            .clone()
            .expect("bind_property requires a Binder created with a property set");
        let definition = set.resolve(name)?;
        if definition.value_type() != TypeId::of::<M>() {
            return Err(BinderError::Property(
                bindery_props::PropertyError::TypeMismatch {
                    name: name.to_owned(),
                    expected: std::any::type_name::<M>(),
                    actual: definition.value_type_name(),
                },
            ));
        }
        Ok(self.bind_definition(definition))
    }

    /// Complete against an already-resolved property definition. The model
    /// type must match the definition's value type.
    pub(crate) fn bind_definition(self, definition: Rc<PropertyDefinition<B>>) -> Binding<B, F, M> {
        let name = definition.name().to_owned();
        let getter_def = Rc::clone(&definition);
        let getter = Rc::new(move |bean: &B| {
            getter_def
                .get(bean)
                .get::<M>()
                .expect("property value type verified at bind time")
        });
        let setter: Option<Rc<dyn Fn(&mut B, M)>> = if definition.is_read_only() {
            None
        } else {
            let setter_def = Rc::clone(&definition);
            Some(Rc::new(move |bean: &mut B, value: M| {
                // Type and writability were verified at bind time.
                let _ = setter_def.set(bean, DynValue::new(value));
            }))
        };
        self.complete(getter, setter, Some(name), false)
    }

    /// Complete against a component of the binder's record schema. The
    /// getter supplies the field's initial value when a template record is
    /// read; writes only happen through `write_record`.
    ///
    /// # Errors
    ///
    /// [`BinderError::UnknownRecordComponent`] for names outside the schema,
    /// [`BinderError::Property`] when the component's type is not `M`.
    ///
    /// # Panics
    ///
    /// When the binder is not in record mode.
    pub fn bind_record_component(
        self,
        name: &str,
        getter: impl Fn(&B) -> M + 'static,
    ) -> Result<Binding<B, F, M>, BinderError> {
        let schema = self
            .binder
            .borrow()
            .record
            .clone()
            .expect("bind_record_component requires a Binder created for a record schema");
        let Some(component) = schema.component_named(name) else {
            return Err(BinderError::UnknownRecordComponent {
                name: name.to_owned(),
            });
        };
        if component.type_id != TypeId::of::<M>() {
            return Err(BinderError::Property(
                bindery_props::PropertyError::TypeMismatch {
                    name: name.to_owned(),
                    expected: std::any::type_name::<M>(),
                    actual: component.type_name,
                },
            ));
        }
        Ok(self.complete(Rc::new(getter), None, Some(name.to_owned()), true))
    }

    pub(crate) fn complete(
        self,
        getter: Rc<dyn Fn(&B) -> M>,
        setter: Option<Rc<dyn Fn(&mut B, M)>>,
        property: Option<String>,
        record_mode: bool,
    ) -> Binding<B, F, M> {
        assert!(
            record_mode || self.binder.borrow().record.is_none(),
            "bean-style completions are not available on a record-mode Binder; use bind_record_component"
        );
        let required = self.required_message.is_some();
        let read_only = setter.is_none() && !record_mode;
        let inner = Rc::new(BindingInner {
            id: BindingId::next(),
            field: self.field,
            label: self.label,
            property,
            chain: self.chain,
            getter,
            setter,
            read_only: Cell::new(read_only),
            validators_disabled: Cell::new(false),
            required: Cell::new(required),
            required_message: self.required_message,
            default_validator_enabled: Cell::new(self.default_validator_enabled),
            convert_back: Cell::new(self.convert_back),
            explicit_eq: self.explicit_eq,
            initial: RefCell::new(None),
            updating_field: Cell::new(false),
            subscription: RefCell::new(None),
            status_override: RefCell::new(None),
            record_mode,
            active: Cell::new(true),
        });
        if required {
            inner.field.set_required_indicator_visible(true);
        }

        let weak_inner = Rc::downgrade(&inner);
        let weak_binder = Rc::downgrade(&self.binder);
        let subscription = inner.field.on_value_change(Rc::new(move |_| {
            let Some(strong) = weak_inner.upgrade() else {
                return;
            };
            if strong.updating_field.get() || !strong.active.get() {
                return;
            }
            let Some(binder) = weak_binder.upgrade() else {
                return;
            };
            crate::binder::handle_field_value_change(&binder, strong as Rc<dyn BoundBinding<B>>);
        }));
        *inner.subscription.borrow_mut() = Some(subscription);

        let erased: Rc<dyn BoundBinding<B>> = Rc::clone(&inner) as Rc<dyn BoundBinding<B>>;
        {
            let mut binder = self.binder.borrow_mut();
            if let Some(pos) = binder
                .bindings
                .iter()
                .position(|b| b.field_id() == erased.field_id())
            {
                let prior = binder.bindings.remove(pos);
                binder.changed.remove(&prior.id().raw());
                prior.deactivate();
                tracing::debug!(
                    field = erased.field_id().id(),
                    "replacing an existing binding on the same field"
                );
            }
            binder.bindings.push(Rc::clone(&erased));
            binder.ever_bound = true;
        }
        {
            // In bean mode, a binding completed after set_bean loads its
            // field immediately.
            let binder = self.binder.borrow();
            if let Some(bean) = &binder.bean {
                inner.read_from(bean);
            }
        }
        tracing::debug!(
            binding = inner.id.raw(),
            field = inner.field.id().id(),
            "binding completed"
        );
        Binding {
            inner,
            binder: Rc::downgrade(&self.binder),
        }
    }
}

impl<B: 'static, F: Field + Clone> BindingBuilder<B, F, DynValue> {
    /// Complete a type-erased binding against a resolved property
    /// definition. The definition already traffics in [`DynValue`], so the
    /// accessors pass values straight through; the instance-field machinery
    /// uses this after bridging the field's presentation type.
    pub(crate) fn bind_erased(self, definition: Rc<PropertyDefinition<B>>) -> Binding<B, F, DynValue> {
        let name = definition.name().to_owned();
        let getter_def = Rc::clone(&definition);
        let getter = Rc::new(move |bean: &B| getter_def.get(bean));
        let setter: Option<Rc<dyn Fn(&mut B, DynValue)>> = if definition.is_read_only() {
            None
        } else {
            let setter_def = Rc::clone(&definition);
            Some(Rc::new(move |bean: &mut B, value: DynValue| {
                // Value type was verified when the bridge was selected.
                let _ = setter_def.set(bean, value);
            }))
        };
        self.complete(getter, setter, Some(name), false)
    }
}
