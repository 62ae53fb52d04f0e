#![forbid(unsafe_code)]

//! The field abstraction bindings attach to.
//!
//! A [`Field`] is anything exposing a value, an empty value, read-only and
//! required-indicator flags, an invalid-state setter, and a value-change
//! subscription. [`InputField`] is the toolkit-independent reference
//! implementation, shared through `Rc<RefCell<..>>` like the rest of the
//! engine.
//!
//! # Invariants
//!
//! 1. Setting a value equal to the current value is a no-op (no
//!    notifications).
//! 2. Subscribers are notified in registration order.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 4. Cloned field handles share state and report the same [`FieldId`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::validator::Validator;

/// Global counter for unique field IDs.
static FIELD_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a field instance. Cloned handles share one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(u64);

impl FieldId {
    /// Allocate a fresh, process-unique id.
    #[must_use]
    pub fn next() -> Self {
        Self(FIELD_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// RAII guard for a value-change subscription. Dropping it unsubscribes.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap an unsubscribe action.
    #[must_use]
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// A UI input that a binding can attach to.
pub trait Field: 'static {
    /// The presentation value type.
    type Value: Clone + PartialEq + 'static;

    /// Stable identity; cloned handles of one field report the same id.
    fn id(&self) -> FieldId;

    /// Current value.
    fn value(&self) -> Self::Value;

    /// Replace the value, notifying subscribers if it changed.
    fn set_value(&self, value: Self::Value);

    /// The value representing "nothing entered".
    fn empty_value(&self) -> Self::Value;

    /// Toggle the field's read-only state.
    fn set_read_only(&self, read_only: bool);

    /// Toggle the required-indicator decoration.
    fn set_required_indicator_visible(&self, visible: bool);

    /// Show (`Some(message)`) or clear (`None`) the invalid state.
    fn set_invalid(&self, message: Option<String>);

    /// A validator the field itself carries (e.g. a date picker rejecting
    /// out-of-calendar input). Bindings run it ahead of the chain unless
    /// default validators are disabled.
    fn default_validator(&self) -> Option<Rc<dyn Validator<Self::Value>>> {
        None
    }

    /// Subscribe to value changes. The returned guard unsubscribes on drop.
    fn on_value_change(&self, callback: Rc<dyn Fn(&Self::Value)>) -> Subscription;

    /// Human-readable label used in error messages.
    fn label(&self) -> Option<String> {
        None
    }
}

struct FieldInner<T> {
    value: T,
    empty: T,
    label: Option<String>,
    read_only: bool,
    required_visible: bool,
    invalid: Option<String>,
    default_validator: Option<Rc<dyn Validator<T>>>,
    subscribers: Vec<(u64, Rc<dyn Fn(&T)>)>,
    next_subscriber: u64,
}

/// Reference [`Field`] implementation backed by shared single-threaded state.
///
/// Cloning an `InputField` produces another handle to the same field.
pub struct InputField<T: Clone + PartialEq + 'static> {
    inner: Rc<RefCell<FieldInner<T>>>,
    id: FieldId,
}

impl<T: Clone + PartialEq + 'static> Clone for InputField<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            id: self.id,
        }
    }
}

impl<T: Clone + PartialEq + 'static> InputField<T> {
    /// Create a field whose value and empty value start as `empty`.
    #[must_use]
    pub fn new(empty: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FieldInner {
                value: empty.clone(),
                empty,
                label: None,
                read_only: false,
                required_visible: false,
                invalid: None,
                default_validator: None,
                subscribers: Vec::new(),
                next_subscriber: 0,
            })),
            id: FieldId::next(),
        }
    }

    /// Attach a label used in error messages.
    #[must_use]
    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.inner.borrow_mut().label = Some(label.into());
        self
    }

    /// Attach a field-carried default validator.
    #[must_use]
    pub fn with_default_validator(self, validator: Rc<dyn Validator<T>>) -> Self {
        self.inner.borrow_mut().default_validator = Some(validator);
        self
    }

    /// Current invalid-state message, if any. Primarily for assertions.
    #[must_use]
    pub fn invalid_message(&self) -> Option<String> {
        self.inner.borrow().invalid.clone()
    }

    /// Whether the read-only flag is set.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.inner.borrow().read_only
    }

    /// Whether the required indicator is shown.
    #[must_use]
    pub fn is_required_indicator_visible(&self) -> bool {
        self.inner.borrow().required_visible
    }

    fn notify(&self, value: &T) {
        // Clone callbacks out so subscribers may mutate the field re-entrantly.
        let callbacks: Vec<Rc<dyn Fn(&T)>> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Field for InputField<T> {
    type Value = T;

    fn id(&self) -> FieldId {
        self.id
    }

    fn value(&self) -> T {
        self.inner.borrow().value.clone()
    }

    fn set_value(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value.clone();
        }
        self.notify(&value);
    }

    fn empty_value(&self) -> T {
        self.inner.borrow().empty.clone()
    }

    fn set_read_only(&self, read_only: bool) {
        self.inner.borrow_mut().read_only = read_only;
    }

    fn set_required_indicator_visible(&self, visible: bool) {
        self.inner.borrow_mut().required_visible = visible;
    }

    fn set_invalid(&self, message: Option<String>) {
        self.inner.borrow_mut().invalid = message;
    }

    fn default_validator(&self) -> Option<Rc<dyn Validator<T>>> {
        self.inner.borrow().default_validator.clone()
    }

    fn on_value_change(&self, callback: Rc<dyn Fn(&T)>) -> Subscription {
        let key = {
            let mut inner = self.inner.borrow_mut();
            let key = inner.next_subscriber;
            inner.next_subscriber += 1;
            inner.subscribers.push((key, callback));
            key
        };
        let weak: Weak<RefCell<FieldInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|(k, _)| *k != key);
            }
        })
    }

    fn label(&self) -> Option<String> {
        self.inner.borrow().label.clone()
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> std::fmt::Debug for InputField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("InputField")
            .field("id", &self.id.id())
            .field("value", &inner.value)
            .field("read_only", &inner.read_only)
            .field("invalid", &inner.invalid)
            .finish()
    }
}
