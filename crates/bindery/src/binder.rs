#![forbid(unsafe_code)]

//! The binder: a group of bindings sharing one target bean or record.
//!
//! A binder runs in one of two modes. In bean mode it can hold a bean of its
//! own (`set_bean`), in which case every field edit validates the changed
//! bindings and, when they all pass, writes them through to the bean
//! immediately; without a held bean, values move only through the explicit
//! `read_bean`/`write_bean` calls. In record mode (`for_record`) there is no
//! mutable target at all: `write_record` validates every binding and
//! constructs a fresh record from the converted component values.
//!
//! # Invariants
//!
//! 1. `write_bean` is atomic: on any validation failure the target bean is
//!    left exactly as it was, field writes rolled back in reverse order.
//! 2. A field edit marks its binding changed; converting back to the
//!    snapshot value unmarks it when change detection (or an explicit
//!    equality predicate) is in effect.
//! 3. Programmatic writes performed by the binder itself never re-enter the
//!    change pipeline.
//!
//! # Failure Modes
//!
//! - Bean-mode operations called on a record-mode binder (and vice versa)
//!   panic: the mode is fixed at construction and mixing them is a
//!   programming error.
//! - `write_record` with an unbound schema component returns
//!   [`WriteRecordError::MissingComponent`].

use std::cell::RefCell;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};

use bindery_core::{DynValue, Field, ValidationResult, Validator, ValueContext};
use bindery_props::{HasPropertySet, PropertySet, property_set_for};

use crate::binding::{BindingBuilder, BoundBinding};
use crate::instance_fields::ConverterFactory;
use crate::record::{RecordComponents, RecordSchema};
use crate::status::{
    BinderError, BinderValidationStatus, BindingValidationStatus, ValidationException,
    WriteRecordError,
};

/// Binder-wide validation switches, copied into each pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinderFlags {
    pub validators_disabled: bool,
    pub default_validators_enabled: bool,
    pub change_detection: bool,
}

impl Default for BinderFlags {
    fn default() -> Self {
        Self {
            validators_disabled: false,
            default_validators_enabled: true,
            change_detection: false,
        }
    }
}

pub(crate) struct BinderInner<B: 'static> {
    pub(crate) property_set: Option<Rc<PropertySet<B>>>,
    pub(crate) record: Option<Rc<RecordSchema<B>>>,
    pub(crate) bindings: Vec<Rc<dyn BoundBinding<B>>>,
    pub(crate) bean: Option<B>,
    pub(crate) bean_validators: Vec<Rc<dyn Validator<B>>>,
    /// Raw ids of bindings whose fields changed since the last read/write.
    pub(crate) changed: AHashSet<u64>,
    pub(crate) flags: BinderFlags,
    pub(crate) status_handler: Option<Rc<dyn Fn(&BinderValidationStatus)>>,
    pub(crate) bean_status_handler: Option<Rc<dyn Fn(&[ValidationResult])>>,
    pub(crate) converters: ConverterFactory,
    pub(crate) ever_bound: bool,
    /// Re-entrancy guard: set while the binder itself is writing.
    pub(crate) writing: bool,
}

impl<B: 'static> BinderInner<B> {
    fn new(property_set: Option<Rc<PropertySet<B>>>, record: Option<Rc<RecordSchema<B>>>) -> Self {
        Self {
            property_set,
            record,
            bindings: Vec::new(),
            bean: None,
            bean_validators: Vec::new(),
            changed: AHashSet::new(),
            flags: BinderFlags::default(),
            status_handler: None,
            bean_status_handler: None,
            converters: ConverterFactory::with_defaults(),
            ever_bound: false,
            writing: false,
        }
    }
}

/// Groups bindings toward one bean type `B`, coordinating validation, commit,
/// and change tracking.
///
/// Cloning a `Binder` produces another handle to the same binder.
pub struct Binder<B: 'static> {
    pub(crate) inner: Rc<RefCell<BinderInner<B>>>,
}

impl<B: 'static> Clone for Binder<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: 'static> Default for Binder<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: 'static> Binder<B> {
    /// A bean-mode binder without a property set. Bindings complete through
    /// explicit accessors only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BinderInner::new(None, None))),
        }
    }

    /// A bean-mode binder resolving `bind_property` names against `set`.
    #[must_use]
    pub fn with_property_set(set: Rc<PropertySet<B>>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BinderInner::new(Some(set), None))),
        }
    }

    /// A record-mode binder. Bindings complete against schema components and
    /// the only write path is [`write_record`](Self::write_record).
    #[must_use]
    pub fn for_record(schema: RecordSchema<B>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BinderInner::new(None, Some(Rc::new(schema))))),
        }
    }

    /// Start a binding for `field`. Clears any stale invalid state the field
    /// carries from an earlier binding.
    #[must_use]
    pub fn for_field<F: Field + Clone>(&self, field: &F) -> BindingBuilder<B, F, F::Value> {
        field.set_invalid(None);
        BindingBuilder::start(
            Rc::clone(&self.inner),
            field.clone(),
            Box::new(bindery_core::Identity::new()),
        )
    }

    /// Add a bean-level validator, run against the fully-written bean (or
    /// constructed record) after all field-level validation passes.
    #[must_use]
    pub fn with_validator(self, validator: impl Validator<B> + 'static) -> Self {
        self.inner
            .borrow_mut()
            .bean_validators
            .push(Rc::new(validator));
        self
    }

    // -- bean lifecycle -----------------------------------------------------

    /// Attach `bean`, loading every field from it and switching the binder to
    /// write-through: each subsequent valid field edit commits immediately.
    ///
    /// Values that normalize during conversion (e.g. trimming) are written
    /// back to the bean once during attachment, so bean and fields agree.
    ///
    /// # Panics
    ///
    /// On a record-mode binder.
    pub fn set_bean(&self, bean: B) {
        self.assert_bean_mode("set_bean");
        let (bindings, flags) = {
            let mut inner = self.inner.borrow_mut();
            inner.bean = None;
            inner.changed.clear();
            inner.writing = true;
            (inner.bindings.clone(), inner.flags)
        };
        for binding in &bindings {
            binding.read_from(&bean);
        }
        let mut bean = bean;
        for binding in &bindings {
            let (Some(value), _) = binding.check(flags) else {
                continue;
            };
            if binding.current_model(&bean) != value && binding.apply(&mut bean, &value).is_some()
            {
                binding.post_write(&value);
            }
        }
        let mut inner = self.inner.borrow_mut();
        inner.bean = Some(bean);
        inner.writing = false;
        tracing::debug!(bindings = bindings.len(), "bean attached");
    }

    /// Detach and return the held bean, if any. Fields keep their values.
    pub fn remove_bean(&self) -> Option<B> {
        let mut inner = self.inner.borrow_mut();
        inner.changed.clear();
        let bean = inner.bean.take();
        if bean.is_some() {
            tracing::debug!("bean detached");
        }
        bean
    }

    /// Whether a bean is currently attached.
    #[must_use]
    pub fn has_bean(&self) -> bool {
        self.inner.borrow().bean.is_some()
    }

    /// Load every field from `bean` without attaching it. Resets change
    /// tracking; later edits only reach a bean through an explicit write.
    pub fn read_bean(&self, bean: &B) {
        let bindings = {
            let mut inner = self.inner.borrow_mut();
            inner.changed.clear();
            inner.bindings.clone()
        };
        for binding in &bindings {
            binding.read_from(bean);
        }
    }

    /// Reset every bound field to its empty value and clear validation
    /// state. Resets change tracking.
    pub fn clear_fields(&self) {
        let bindings = {
            let mut inner = self.inner.borrow_mut();
            inner.changed.clear();
            inner.bindings.clone()
        };
        for binding in &bindings {
            binding.clear_field();
        }
    }

    // -- explicit writes ----------------------------------------------------

    /// Validate every binding and, if all pass, write every writable one
    /// into `bean`, then run the bean-level validators against the result.
    ///
    /// # Errors
    ///
    /// [`ValidationException`] with the full set of failures. The bean is
    /// then guaranteed untouched: field-level failures prevent any write,
    /// and bean-level failures roll back the already-applied field writes
    /// in reverse order.
    ///
    /// # Panics
    ///
    /// On a record-mode binder.
    pub fn write_bean(&self, bean: &mut B) -> Result<(), ValidationException> {
        self.assert_bean_mode("write_bean");
        let subset = self.inner.borrow().bindings.clone();
        self.write_subset(bean, subset)
    }

    /// Like [`write_bean`](Self::write_bean), reporting success as `bool`.
    pub fn write_bean_if_valid(&self, bean: &mut B) -> bool {
        self.write_bean(bean).is_ok()
    }

    /// Write only the bindings whose fields changed since the last
    /// read/write. Validation and atomicity match `write_bean`, restricted
    /// to that subset.
    ///
    /// # Errors
    ///
    /// [`ValidationException`] as for `write_bean`.
    ///
    /// # Panics
    ///
    /// On a record-mode binder.
    pub fn write_changed_bindings_to_bean(&self, bean: &mut B) -> Result<(), ValidationException> {
        self.assert_bean_mode("write_changed_bindings_to_bean");
        let subset = {
            let inner = self.inner.borrow();
            inner
                .bindings
                .iter()
                .filter(|b| inner.changed.contains(&b.id().raw()))
                .cloned()
                .collect::<Vec<_>>()
        };
        self.write_subset(bean, subset)
    }

    fn write_subset(
        &self,
        bean: &mut B,
        subset: Vec<Rc<dyn BoundBinding<B>>>,
    ) -> Result<(), ValidationException> {
        let (validators, flags) = {
            let mut inner = self.inner.borrow_mut();
            inner.writing = true;
            (inner.bean_validators.clone(), inner.flags)
        };
        let outcome = do_write(bean, &subset, &validators, flags);
        {
            let mut inner = self.inner.borrow_mut();
            inner.writing = false;
            if outcome.ok {
                for binding in &subset {
                    inner.changed.remove(&binding.id().raw());
                }
            }
        }
        let result = if outcome.ok {
            Ok(())
        } else {
            Err(exception_from(&outcome))
        };
        fire_statuses(&self.inner, outcome.statuses, outcome.bean_results);
        result
    }

    // -- record mode --------------------------------------------------------

    /// Validate every binding, then construct a fresh record from the
    /// converted component values and run the record-level validators
    /// against it.
    ///
    /// # Errors
    ///
    /// [`WriteRecordError::MissingComponent`] when a schema component has no
    /// binding, [`WriteRecordError::Invalid`] on validation failure (the
    /// partially-constructed record is discarded).
    ///
    /// # Panics
    ///
    /// On a bean-mode binder.
    pub fn write_record(&self) -> Result<B, WriteRecordError> {
        self.inner.borrow_mut().writing = true;
        let result = self.write_record_inner();
        self.inner.borrow_mut().writing = false;
        result
    }

    fn write_record_inner(&self) -> Result<B, WriteRecordError> {
        let (schema, bindings, validators, flags) = {
            let inner = self.inner.borrow();
            let schema = inner
                .record
                .clone()
                .expect("write_record requires a Binder created for a record schema");
            (
                schema,
                inner.bindings.clone(),
                inner.bean_validators.clone(),
                inner.flags,
            )
        };

        for component in schema.components() {
            let bound = bindings
                .iter()
                .any(|b| b.property_name().as_deref() == Some(component.name.as_str()));
            if !bound {
                return Err(WriteRecordError::MissingComponent(component.name.clone()));
            }
        }

        let mut statuses = Vec::with_capacity(bindings.len());
        let mut values: AHashMap<String, DynValue> = AHashMap::new();
        let mut any_error = false;
        for binding in &bindings {
            let (value, status) = binding.check(flags);
            any_error |= status.is_error();
            if let (Some(value), Some(name)) = (value, binding.property_name()) {
                values.insert(name, value);
            }
            statuses.push((Rc::clone(binding), status));
        }
        if any_error {
            let exception = ValidationException::new(
                statuses
                    .iter()
                    .filter(|(_, s)| s.is_error())
                    .map(|(_, s)| s.clone())
                    .collect(),
                Vec::new(),
            );
            fire_statuses(&self.inner, statuses, Vec::new());
            return Err(WriteRecordError::Invalid(exception));
        }

        let components = RecordComponents::new(values);
        let record = schema.construct(&components);

        let mut bean_results = Vec::new();
        if !flags.validators_disabled {
            let ctx = ValueContext::new();
            for validator in &validators {
                let result = validator.validate(&record, &ctx);
                if !result.is_ok() {
                    bean_results.push(result);
                }
            }
        }
        if bean_results.iter().any(ValidationResult::is_error) {
            let errors: Vec<ValidationResult> = bean_results
                .iter()
                .filter(|r| r.is_error())
                .cloned()
                .collect();
            fire_statuses(&self.inner, statuses, bean_results);
            return Err(WriteRecordError::Invalid(ValidationException::new(
                Vec::new(),
                errors,
            )));
        }

        for binding in &bindings {
            if let Some(name) = binding.property_name() {
                if let Some(value) = components.raw(&name) {
                    binding.post_write(value);
                }
            }
        }
        self.inner.borrow_mut().changed.clear();
        fire_statuses(&self.inner, statuses, bean_results);
        tracing::debug!(components = schema.components().len(), "record written");
        Ok(record)
    }

    // -- validation ---------------------------------------------------------

    /// Validate every binding and (with a bean attached) the bean-level
    /// validators, routing outcomes to the status displays.
    pub fn validate(&self) -> BinderValidationStatus {
        let (pairs, bean_results) = self.validate_inner();
        let status = BinderValidationStatus::new(
            pairs.iter().map(|(_, s)| s.clone()).collect(),
            bean_results.clone(),
        );
        fire_statuses(&self.inner, pairs, bean_results);
        status
    }

    /// Whether everything currently validates, without touching any status
    /// display.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let (pairs, bean_results) = self.validate_inner();
        !pairs.iter().any(|(_, s)| s.is_error())
            && !bean_results.iter().any(ValidationResult::is_error)
    }

    #[allow(clippy::type_complexity)]
    fn validate_inner(
        &self,
    ) -> (
        Vec<(Rc<dyn BoundBinding<B>>, BindingValidationStatus)>,
        Vec<ValidationResult>,
    ) {
        let (bindings, validators, flags) = {
            let inner = self.inner.borrow();
            (
                inner.bindings.clone(),
                inner.bean_validators.clone(),
                inner.flags,
            )
        };
        let pairs: Vec<_> = bindings
            .iter()
            .map(|b| {
                let (_, status) = b.check(flags);
                (Rc::clone(b), status)
            })
            .collect();
        let field_ok = !pairs.iter().any(|(_, s)| s.is_error());
        let mut bean_results = Vec::new();
        if field_ok && !flags.validators_disabled {
            let inner = self.inner.borrow();
            if let Some(bean) = &inner.bean {
                let ctx = ValueContext::new();
                for validator in &validators {
                    let result = validator.validate(bean, &ctx);
                    if !result.is_ok() {
                        bean_results.push(result);
                    }
                }
            }
        }
        (pairs, bean_results)
    }

    // -- change tracking and flags ------------------------------------------

    /// Whether any binding's field changed since the last read/write.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.inner.borrow().changed.is_empty()
    }

    /// Skip every validator (field-level, default, and bean-level) until
    /// re-enabled. Converters still run.
    pub fn set_validators_disabled(&self, disabled: bool) {
        self.inner.borrow_mut().flags.validators_disabled = disabled;
    }

    /// Whether validators are currently skipped.
    #[must_use]
    pub fn is_validators_disabled(&self) -> bool {
        self.inner.borrow().flags.validators_disabled
    }

    /// Toggle whether fields' own default validators run (bindings may
    /// override per binding). On by default.
    pub fn set_default_validators_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().flags.default_validators_enabled = enabled;
    }

    /// Enable change reversion: an edit that converts back to the snapshot
    /// value (by model equality) unmarks its binding as changed. Off by
    /// default; bindings with an explicit equality predicate revert
    /// regardless of this flag.
    pub fn set_change_detection_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().flags.change_detection = enabled;
    }

    /// Whether change reversion is enabled.
    #[must_use]
    pub fn is_change_detection_enabled(&self) -> bool {
        self.inner.borrow().flags.change_detection
    }

    // -- status handlers ----------------------------------------------------

    /// Replace the default status display (per-field invalid state) with a
    /// single handler receiving every validation outcome.
    pub fn set_validation_status_handler(&self, handler: Rc<dyn Fn(&BinderValidationStatus)>) {
        let mut inner = self.inner.borrow_mut();
        if inner.status_handler.is_some() {
            tracing::warn!("replacing an already-registered binder validation status handler");
        }
        inner.status_handler = Some(handler);
    }

    /// Handler for bean-level validator results, used when no whole-binder
    /// status handler is registered.
    pub fn set_bean_validation_status_handler(&self, handler: Rc<dyn Fn(&[ValidationResult])>) {
        let mut inner = self.inner.borrow_mut();
        if inner.bean_status_handler.is_some() {
            tracing::warn!("replacing an already-registered bean validation status handler");
        }
        inner.bean_status_handler = Some(handler);
    }

    // -- bulk field state ---------------------------------------------------

    /// Toggle read-only on every binding that has a write path. Bindings
    /// bound with a getter only are left alone: they are permanently
    /// read-only.
    pub fn set_read_only(&self, read_only: bool) {
        let bindings = self.inner.borrow().bindings.clone();
        for binding in &bindings {
            if binding.has_setter() {
                binding.force_read_only(read_only);
            }
        }
    }

    // -- lookups ------------------------------------------------------------

    /// Handles to every registered binding, in completion order.
    #[must_use]
    pub fn bindings(&self) -> Vec<BindingHandle<B>> {
        self.inner
            .borrow()
            .bindings
            .iter()
            .map(|b| BindingHandle {
                inner: Rc::clone(b),
            })
            .collect()
    }

    /// The binding completed against the property or record component named
    /// `property`, if any.
    #[must_use]
    pub fn binding_for(&self, property: &str) -> Option<BindingHandle<B>> {
        self.inner
            .borrow()
            .bindings
            .iter()
            .find(|b| b.property_name().as_deref() == Some(property))
            .map(|b| BindingHandle {
                inner: Rc::clone(b),
            })
    }

    fn assert_bean_mode(&self, operation: &str) {
        assert!(
            self.inner.borrow().record.is_none(),
            "{operation} is not available on a record-mode Binder; use write_record"
        );
    }
}

impl<B: HasPropertySet> Binder<B> {
    /// A bean-mode binder using `B`'s registered property set.
    #[must_use]
    pub fn for_bean_type() -> Self {
        Self::with_property_set(property_set_for::<B>())
    }
}

impl<B: Clone + 'static> Binder<B> {
    /// A copy of the held bean, if one is attached.
    #[must_use]
    pub fn bean(&self) -> Option<B> {
        self.inner.borrow().bean.clone()
    }
}

// ---------------------------------------------------------------------------
// Binding lookups
// ---------------------------------------------------------------------------

/// Type-erased handle to a registered binding, as returned by the binder's
/// lookups. The typed [`Binding`](crate::binding::Binding) handle from the
/// builder offers the full control surface; this one covers what makes sense
/// without knowing the field and model types.
pub struct BindingHandle<B: 'static> {
    inner: Rc<dyn BoundBinding<B>>,
}

impl<B: 'static> BindingHandle<B> {
    /// The binding's identity.
    #[must_use]
    pub fn id(&self) -> crate::binding::BindingId {
        self.inner.id()
    }

    /// The bound property or record component name, if any.
    #[must_use]
    pub fn property_name(&self) -> Option<String> {
        self.inner.property_name()
    }

    /// Whether the binding currently refuses writes.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    /// Toggle the binding's read-only state, mirroring it onto the field.
    ///
    /// # Errors
    ///
    /// [`BinderError::NoSetter`] when trying to make a setter-less binding
    /// writable.
    pub fn set_read_only(&self, read_only: bool) -> Result<(), BinderError> {
        if !read_only && !self.inner.has_setter() {
            return Err(BinderError::NoSetter {
                property: self.inner.property_name(),
            });
        }
        self.inner.force_read_only(read_only);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Write machinery
// ---------------------------------------------------------------------------

struct WriteOutcome<B: 'static> {
    statuses: Vec<(Rc<dyn BoundBinding<B>>, BindingValidationStatus)>,
    bean_results: Vec<ValidationResult>,
    ok: bool,
}

/// Two-phase commit of `subset` into `bean`.
///
/// Phase one converts and validates every binding without touching the bean;
/// any blocking failure stops here. Phase two applies the values, collecting
/// a revert closure per write, then runs the bean-level validators against
/// the mutated bean; if one fails, the reverts replay in reverse order and
/// the bean is back in its pre-call state.
fn do_write<B: 'static>(
    bean: &mut B,
    subset: &[Rc<dyn BoundBinding<B>>],
    validators: &[Rc<dyn Validator<B>>],
    flags: BinderFlags,
) -> WriteOutcome<B> {
    let mut checked = Vec::with_capacity(subset.len());
    let mut any_error = false;
    for binding in subset {
        let (value, status) = binding.check(flags);
        any_error |= status.is_error();
        checked.push((Rc::clone(binding), value, status));
    }
    if any_error {
        return WriteOutcome {
            statuses: checked.into_iter().map(|(b, _, s)| (b, s)).collect(),
            bean_results: Vec::new(),
            ok: false,
        };
    }

    let mut reverts: Vec<Box<dyn FnOnce(&mut B)>> = Vec::new();
    let mut written: Vec<(Rc<dyn BoundBinding<B>>, DynValue)> = Vec::new();
    for (binding, value, _) in &checked {
        if let Some(value) = value {
            if let Some(revert) = binding.apply(bean, value) {
                reverts.push(revert);
                written.push((Rc::clone(binding), value.clone()));
            }
        }
    }

    let mut bean_results = Vec::new();
    if !flags.validators_disabled {
        let ctx = ValueContext::new();
        for validator in validators {
            let result = validator.validate(&*bean, &ctx);
            if !result.is_ok() {
                bean_results.push(result);
            }
        }
    }

    if bean_results.iter().any(ValidationResult::is_error) {
        let count = reverts.len();
        for revert in reverts.into_iter().rev() {
            revert(bean);
        }
        tracing::debug!(
            reverted = count,
            "bean-level validation failed, field writes rolled back"
        );
        return WriteOutcome {
            statuses: checked.into_iter().map(|(b, _, s)| (b, s)).collect(),
            bean_results,
            ok: false,
        };
    }

    for (binding, value) in &written {
        binding.post_write(value);
    }
    WriteOutcome {
        statuses: checked.into_iter().map(|(b, _, s)| (b, s)).collect(),
        bean_results,
        ok: true,
    }
}

fn exception_from<B: 'static>(outcome: &WriteOutcome<B>) -> ValidationException {
    ValidationException::new(
        outcome
            .statuses
            .iter()
            .filter(|(_, s)| s.is_error())
            .map(|(_, s)| s.clone())
            .collect(),
        outcome
            .bean_results
            .iter()
            .filter(|r| r.is_error())
            .cloned()
            .collect(),
    )
}

/// Route validation outcomes to the registered displays: the whole-binder
/// handler replaces everything else; otherwise each binding shows or clears
/// its field's invalid state and bean-level results go to their handler.
fn fire_statuses<B: 'static>(
    binder: &Rc<RefCell<BinderInner<B>>>,
    pairs: Vec<(Rc<dyn BoundBinding<B>>, BindingValidationStatus)>,
    bean_results: Vec<ValidationResult>,
) {
    let (handler, bean_handler) = {
        let inner = binder.borrow();
        (
            inner.status_handler.clone(),
            inner.bean_status_handler.clone(),
        )
    };
    if let Some(handler) = handler {
        let status = BinderValidationStatus::new(
            pairs.iter().map(|(_, s)| s.clone()).collect(),
            bean_results,
        );
        handler(&status);
        return;
    }
    for (binding, status) in &pairs {
        binding.display_status(status);
    }
    if !bean_results.is_empty() {
        if let Some(bean_handler) = bean_handler {
            bean_handler(&bean_results);
        } else {
            tracing::debug!(
                results = bean_results.len(),
                "bean-level validation results with no handler registered"
            );
        }
    }
}

/// Reaction to a user edit of a bound field: mark the binding changed (or
/// unmark it when the edit reverts to the snapshot), then either write
/// through to an attached bean or validate the single binding for display.
pub(crate) fn handle_field_value_change<B: 'static>(
    binder: &Rc<RefCell<BinderInner<B>>>,
    binding: Rc<dyn BoundBinding<B>>,
) {
    let (flags, writing, has_bean) = {
        let mut inner = binder.borrow_mut();
        inner.changed.insert(binding.id().raw());
        (inner.flags, inner.writing, inner.bean.is_some())
    };
    if writing {
        return;
    }
    tracing::trace!(binding = binding.id().raw(), "field value changed");

    let reverted = binding.matches_initial(flags) == Some(true);
    if reverted {
        binder.borrow_mut().changed.remove(&binding.id().raw());
        tracing::trace!(
            binding = binding.id().raw(),
            "edit reverted to the snapshot value"
        );
    }

    if has_bean {
        if reverted {
            let (_, status) = binding.check(flags);
            fire_statuses(binder, vec![(binding, status)], Vec::new());
        }
        write_through(binder);
    } else {
        let (_, status) = binding.check(flags);
        fire_statuses(binder, vec![(binding, status)], Vec::new());
    }
}

/// Validate and commit the changed bindings into the attached bean. On any
/// failure the bean keeps its previous values and the errors are displayed.
fn write_through<B: 'static>(binder: &Rc<RefCell<BinderInner<B>>>) {
    let (mut bean, subset, validators, flags) = {
        let mut inner = binder.borrow_mut();
        let Some(bean) = inner.bean.take() else {
            return;
        };
        inner.writing = true;
        let subset: Vec<Rc<dyn BoundBinding<B>>> = inner
            .bindings
            .iter()
            .filter(|b| inner.changed.contains(&b.id().raw()))
            .cloned()
            .collect();
        (bean, subset, inner.bean_validators.clone(), inner.flags)
    };
    let outcome = do_write(&mut bean, &subset, &validators, flags);
    {
        let mut inner = binder.borrow_mut();
        inner.bean = Some(bean);
        inner.writing = false;
        if outcome.ok {
            for binding in &subset {
                inner.changed.remove(&binding.id().raw());
            }
        }
    }
    if outcome.ok && !subset.is_empty() {
        tracing::debug!(
            bindings = subset.len(),
            "changed bindings written through to the bean"
        );
    }
    fire_statuses(binder, outcome.statuses, outcome.bean_results);
}
