#![forbid(unsafe_code)]

//! Validation statuses and error types surfaced by a [`Binder`].
//!
//! Validation never throws: `validate()` calls return status objects, and
//! only the write operations escalate aggregated errors into a returned
//! [`ValidationException`].
//!
//! [`Binder`]: crate::binder::Binder

use std::fmt;

use bindery_core::{FieldId, ValidationResult};
use bindery_props::PropertyError;

use crate::binding::BindingId;

/// Outcome of validating a single binding: the results of every validator
/// that ran, including non-blocking info/warning entries.
#[derive(Debug, Clone)]
pub struct BindingValidationStatus {
    binding: BindingId,
    field: FieldId,
    label: Option<String>,
    results: Vec<ValidationResult>,
}

impl BindingValidationStatus {
    pub(crate) fn new(
        binding: BindingId,
        field: FieldId,
        label: Option<String>,
        results: Vec<ValidationResult>,
    ) -> Self {
        Self {
            binding,
            field,
            label,
            results,
        }
    }

    /// The binding this status belongs to.
    #[must_use]
    pub fn binding_id(&self) -> BindingId {
        self.binding
    }

    /// The field the binding is attached to.
    #[must_use]
    pub fn field_id(&self) -> FieldId {
        self.field
    }

    /// The field's label, if one is known.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Every validator result collected during the pass.
    #[must_use]
    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    /// Whether any result blocks a write.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.results.iter().any(ValidationResult::is_error)
    }

    /// The first blocking error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.results
            .iter()
            .find(|r| r.is_error())
            .and_then(ValidationResult::message)
    }
}

/// Aggregated outcome of validating a whole binder: one status per binding
/// plus the bean-level validator results.
#[derive(Debug, Clone)]
pub struct BinderValidationStatus {
    field_statuses: Vec<BindingValidationStatus>,
    bean_results: Vec<ValidationResult>,
}

impl BinderValidationStatus {
    pub(crate) fn new(
        field_statuses: Vec<BindingValidationStatus>,
        bean_results: Vec<ValidationResult>,
    ) -> Self {
        Self {
            field_statuses,
            bean_results,
        }
    }

    /// Per-binding statuses, in binding registration order.
    #[must_use]
    pub fn field_statuses(&self) -> &[BindingValidationStatus] {
        &self.field_statuses
    }

    /// Bean-level validator results.
    #[must_use]
    pub fn bean_results(&self) -> &[ValidationResult] {
        &self.bean_results
    }

    /// Statuses that block a write.
    #[must_use]
    pub fn field_errors(&self) -> Vec<&BindingValidationStatus> {
        self.field_statuses
            .iter()
            .filter(|s| s.is_error())
            .collect()
    }

    /// Whether nothing blocks a write.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !self.field_statuses.iter().any(BindingValidationStatus::is_error)
            && !self.bean_results.iter().any(ValidationResult::is_error)
    }
}

/// Aggregated validation failure returned by the write operations.
///
/// Carries every blocking field-level status plus every failing bean-level
/// result. The target bean is guaranteed to be in its pre-call state when
/// this is returned.
#[derive(Debug, Clone)]
pub struct ValidationException {
    field_errors: Vec<BindingValidationStatus>,
    bean_errors: Vec<ValidationResult>,
}

impl ValidationException {
    pub(crate) fn new(
        field_errors: Vec<BindingValidationStatus>,
        bean_errors: Vec<ValidationResult>,
    ) -> Self {
        Self {
            field_errors,
            bean_errors,
        }
    }

    /// Blocking field-level statuses.
    #[must_use]
    pub fn field_errors(&self) -> &[BindingValidationStatus] {
        &self.field_errors
    }

    /// Failing bean-level results.
    #[must_use]
    pub fn bean_errors(&self) -> &[ValidationResult] {
        &self.bean_errors
    }
}

impl fmt::Display for ValidationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation failed: {} field error(s), {} bean-level error(s)",
            self.field_errors.len(),
            self.bean_errors.len()
        )?;
        let first = self
            .field_errors
            .iter()
            .filter_map(BindingValidationStatus::message)
            .next()
            .or_else(|| self.bean_errors.iter().filter_map(ValidationResult::message).next());
        if let Some(message) = first {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationException {}

/// Errors from binder configuration and bind-time resolution.
#[derive(Debug, Clone)]
pub enum BinderError {
    /// Property resolution failed.
    Property(PropertyError),
    /// The binding has no setter, so it cannot be made writable.
    NoSetter {
        /// The bound property name, if the binding came from one.
        property: Option<String>,
    },
    /// Presentation and model types differ and no bridging converter is
    /// registered.
    IncompatibleTypes {
        /// The property the field was matched to.
        property: String,
        /// The field's presentation type.
        presentation: &'static str,
        /// The property's model type.
        model: &'static str,
    },
    /// A record component name is not part of the binder's record schema.
    UnknownRecordComponent {
        /// The requested component name.
        name: String,
    },
    /// `bind_instance_fields` bound nothing, and nothing was bound before it.
    NoInstanceFields,
}

impl fmt::Display for BinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(err) => err.fmt(f),
            Self::NoSetter {
                property: Some(name),
            } => write!(f, "binding for property '{name}' has no setter and cannot be made writable"),
            Self::NoSetter { property: None } => {
                write!(f, "binding has no setter and cannot be made writable")
            }
            Self::IncompatibleTypes {
                property,
                presentation,
                model,
            } => write!(
                f,
                "field of type {presentation} cannot bind to property '{property}' of type {model}: no bridging converter registered"
            ),
            Self::UnknownRecordComponent { name } => {
                write!(f, "'{name}' is not a component of the record schema")
            }
            Self::NoInstanceFields => write!(f, "no instance fields found to bind"),
        }
    }
}

impl std::error::Error for BinderError {}

impl From<PropertyError> for BinderError {
    fn from(err: PropertyError) -> Self {
        Self::Property(err)
    }
}

/// Errors from [`Binder::write_record`](crate::binder::Binder::write_record).
#[derive(Debug, Clone)]
pub enum WriteRecordError {
    /// A schema component has no completed binding.
    MissingComponent(String),
    /// Field-level or record-level validation failed.
    Invalid(ValidationException),
}

impl fmt::Display for WriteRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingComponent(name) => {
                write!(f, "no binding was found for record component '{name}'")
            }
            Self::Invalid(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for WriteRecordError {}

impl From<ValidationException> for WriteRecordError {
    fn from(err: ValidationException) -> Self {
        Self::Invalid(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::ErrorLevel;

    fn status(results: Vec<ValidationResult>) -> BindingValidationStatus {
        BindingValidationStatus::new(BindingId::next(), FieldId::next(), None, results)
    }

    #[test]
    fn warnings_do_not_make_a_status_an_error() {
        let s = status(vec![ValidationResult::create("hmm", ErrorLevel::Warning)]);
        assert!(!s.is_error());
        assert_eq!(s.message(), None);
    }

    #[test]
    fn first_blocking_message_wins() {
        let s = status(vec![
            ValidationResult::create("note", ErrorLevel::Info),
            ValidationResult::error("first"),
            ValidationResult::error("second"),
        ]);
        assert!(s.is_error());
        assert_eq!(s.message(), Some("first"));
    }

    #[test]
    fn binder_status_ok_requires_both_sides_clean() {
        let ok = BinderValidationStatus::new(vec![status(vec![])], vec![]);
        assert!(ok.is_ok());

        let bad_field =
            BinderValidationStatus::new(vec![status(vec![ValidationResult::error("x")])], vec![]);
        assert!(!bad_field.is_ok());
        assert_eq!(bad_field.field_errors().len(), 1);

        let bad_bean =
            BinderValidationStatus::new(vec![], vec![ValidationResult::error("cross-field")]);
        assert!(!bad_bean.is_ok());
    }

    #[test]
    fn exception_display_mentions_first_message() {
        let exception = ValidationException::new(
            vec![status(vec![ValidationResult::error("age must be a number")])],
            vec![],
        );
        let text = exception.to_string();
        assert!(text.contains("1 field error(s)"));
        assert!(text.contains("age must be a number"));
    }

    #[test]
    fn write_record_error_display() {
        let err = WriteRecordError::MissingComponent("x".to_owned());
        assert_eq!(
            err.to_string(),
            "no binding was found for record component 'x'"
        );
    }
}
