#![forbid(unsafe_code)]

//! Stock validators.

use std::fmt::Display;

use crate::context::ValueContext;
use crate::validation::{ErrorLevel, ValidationResult};
use crate::validator::{FnValidator, Validator, from_fn};

/// Validates that a value falls inside an optional `[min, max]` range.
pub struct RangeValidator<T> {
    min: Option<T>,
    max: Option<T>,
    message: String,
    level: ErrorLevel,
}

impl<T: PartialOrd + Display> RangeValidator<T> {
    /// Require `min <= value <= max`.
    #[must_use]
    pub fn new(message: impl Into<String>, min: Option<T>, max: Option<T>) -> Self {
        Self {
            min,
            max,
            message: message.into(),
            level: ErrorLevel::Error,
        }
    }

    /// Require `value >= min`.
    #[must_use]
    pub fn at_least(message: impl Into<String>, min: T) -> Self {
        Self::new(message, Some(min), None)
    }

    /// Require `value <= max`.
    #[must_use]
    pub fn at_most(message: impl Into<String>, max: T) -> Self {
        Self::new(message, None, Some(max))
    }

    /// Report failures at a non-default level.
    #[must_use]
    pub fn with_level(mut self, level: ErrorLevel) -> Self {
        self.level = level;
        self
    }
}

impl<T: PartialOrd + Display> Validator<T> for RangeValidator<T> {
    fn validate(&self, value: &T, _ctx: &ValueContext) -> ValidationResult {
        let below = self.min.as_ref().is_some_and(|min| value < min);
        let above = self.max.as_ref().is_some_and(|max| value > max);
        if below || above {
            ValidationResult::create(self.message.clone(), self.level)
        } else {
            ValidationResult::ok()
        }
    }
}

/// Validates the character length of a string.
pub struct StringLengthValidator {
    min: usize,
    max: usize,
    message: String,
}

impl StringLengthValidator {
    /// Require `min <= value.chars().count() <= max`.
    #[must_use]
    pub fn new(message: impl Into<String>, min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            message: message.into(),
        }
    }
}

impl Validator<String> for StringLengthValidator {
    fn validate(&self, value: &String, _ctx: &ValueContext) -> ValidationResult {
        let len = value.chars().count();
        if len < self.min || len > self.max {
            ValidationResult::error(self.message.clone())
        } else {
            ValidationResult::ok()
        }
    }
}

/// Validates that a string is not blank (empty or whitespace-only).
pub fn not_blank(
    message: impl Into<String>,
) -> FnValidator<impl Fn(&String, &ValueContext) -> ValidationResult> {
    let message = message.into();
    from_fn(move |value: &String, _: &ValueContext| {
        if value.trim().is_empty() {
            ValidationResult::error(message.clone())
        } else {
            ValidationResult::ok()
        }
    })
}
