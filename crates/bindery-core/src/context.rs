#![forbid(unsafe_code)]

//! Per-invocation context handed to converters and validators.

use std::cell::RefCell;
use std::rc::Rc;

use crate::validation::ValidationResult;

/// Context for a single conversion or validation pass.
///
/// Carries the label of the field whose value is being processed (for error
/// messages), an optional locale tag, the fast-exit validators-disabled flag,
/// and an optional sink through which validator stages accumulate non-blocking
/// (info/warning) results.
#[derive(Clone, Default)]
pub struct ValueContext {
    label: Option<String>,
    locale: Option<String>,
    validators_disabled: bool,
    sink: Option<Rc<RefCell<Vec<ValidationResult>>>>,
}

impl ValueContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a field label used in error reporting.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attach a locale tag (e.g. `"en-US"`).
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Disable all validator stages for this pass. Converters still run.
    #[must_use]
    pub fn with_validators_disabled(mut self, disabled: bool) -> Self {
        self.validators_disabled = disabled;
        self
    }

    /// Attach a sink collecting non-blocking validation results.
    #[must_use]
    pub fn with_sink(mut self, sink: Rc<RefCell<Vec<ValidationResult>>>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The field label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The locale tag, if any.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Whether validator stages should fast-exit without running.
    #[must_use]
    pub fn validators_disabled(&self) -> bool {
        self.validators_disabled
    }

    /// Record a non-blocking result into the sink, if one is attached.
    pub fn record(&self, result: ValidationResult) {
        if let Some(sink) = &self.sink {
            sink.borrow_mut().push(result);
        }
    }
}

impl std::fmt::Debug for ValueContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueContext")
            .field("label", &self.label)
            .field("locale", &self.locale)
            .field("validators_disabled", &self.validators_disabled)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
