#![forbid(unsafe_code)]

//! Validators and their representation as converter stages.
//!
//! A [`Validator`] checks a value without altering it. To keep a binding's
//! pipeline linear, validators fold into the converter chain as a
//! [`ValidatorStage`]: a converter whose model direction passes the original
//! value through unchanged, short-circuits on blocking failures, and records
//! non-blocking (info/warning) results into the context sink.

use crate::context::ValueContext;
use crate::converter::Converter;
use crate::validation::{ConversionResult, ValidationResult, ValueError};

/// A check producing ok or a failure with a message and severity. Never
/// alters the value under validation.
pub trait Validator<T> {
    /// Validate `value`.
    fn validate(&self, value: &T, ctx: &ValueContext) -> ValidationResult;
}

/// A validator assembled from a closure.
pub struct FnValidator<F> {
    check: F,
}

impl<T, F> Validator<T> for FnValidator<F>
where
    F: Fn(&T, &ValueContext) -> ValidationResult,
{
    fn validate(&self, value: &T, ctx: &ValueContext) -> ValidationResult {
        (self.check)(value, ctx)
    }
}

/// Build a validator from a closure.
pub fn from_fn<T, F>(check: F) -> FnValidator<F>
where
    F: Fn(&T, &ValueContext) -> ValidationResult,
{
    FnValidator { check }
}

impl<T, V: Validator<T> + ?Sized> Validator<T> for std::rc::Rc<V> {
    fn validate(&self, value: &T, ctx: &ValueContext) -> ValidationResult {
        (**self).validate(value, ctx)
    }
}

/// A validator lifted into a converter chain stage.
///
/// The stage preserves the value in both directions. On a blocking failure
/// the model direction returns `Err`, carrying the validator's message and
/// level; info/warning failures are recorded into the context sink and the
/// value continues to flow.
pub struct ValidatorStage<V> {
    validator: V,
}

impl<V> ValidatorStage<V> {
    /// Wrap a validator as a chain stage.
    #[must_use]
    pub fn new(validator: V) -> Self {
        Self { validator }
    }
}

impl<T, V> Converter<T, T> for ValidatorStage<V>
where
    T: Clone,
    V: Validator<T>,
{
    fn to_model(&self, value: T, ctx: &ValueContext) -> ConversionResult<T> {
        if ctx.validators_disabled() {
            return Ok(value);
        }
        let result = self.validator.validate(&value, ctx);
        match result.error_level() {
            Some(level) if level.is_error() => Err(ValueError::with_level(
                result.message().unwrap_or("validation failed").to_owned(),
                level,
            )),
            Some(_) => {
                ctx.record(result);
                Ok(value)
            }
            None => Ok(value),
        }
    }

    fn to_presentation(&self, value: T, _ctx: &ValueContext) -> T {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorLevel;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn positive() -> impl Validator<i32> {
        from_fn(|v: &i32, _: &ValueContext| {
            if *v > 0 {
                ValidationResult::ok()
            } else {
                ValidationResult::error("must be positive")
            }
        })
    }

    #[test]
    fn stage_passes_valid_value_through() {
        let stage = ValidatorStage::new(positive());
        let ctx = ValueContext::new();
        assert_eq!(stage.to_model(5, &ctx), Ok(5));
    }

    #[test]
    fn stage_blocks_on_error() {
        let stage = ValidatorStage::new(positive());
        let ctx = ValueContext::new();
        let err = stage.to_model(-5, &ctx).unwrap_err();
        assert_eq!(err.message(), "must be positive");
        assert_eq!(err.level(), ErrorLevel::Error);
    }

    #[test]
    fn stage_records_warning_and_continues() {
        let warn = from_fn(|_: &i32, _: &ValueContext| {
            ValidationResult::create("suspicious", ErrorLevel::Warning)
        });
        let stage = ValidatorStage::new(warn);
        let sink = Rc::new(RefCell::new(Vec::new()));
        let ctx = ValueContext::new().with_sink(Rc::clone(&sink));
        assert_eq!(stage.to_model(1, &ctx), Ok(1));
        assert_eq!(sink.borrow().len(), 1);
        assert_eq!(sink.borrow()[0].message(), Some("suspicious"));
    }

    #[test]
    fn stage_fast_exits_when_disabled() {
        let stage = ValidatorStage::new(positive());
        let ctx = ValueContext::new().with_validators_disabled(true);
        assert_eq!(stage.to_model(-5, &ctx), Ok(-5));
    }

    #[test]
    fn presentation_direction_is_identity() {
        let stage = ValidatorStage::new(positive());
        let ctx = ValueContext::new();
        assert_eq!(stage.to_presentation(-5, &ctx), -5);
    }
}
