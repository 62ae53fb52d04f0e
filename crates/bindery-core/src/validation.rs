#![forbid(unsafe_code)]

//! Validation outcomes and severity levels.
//!
//! # Invariants
//!
//! 1. [`ErrorLevel`] ordering is `Info < Warning < Error < Critical < System`.
//! 2. Only `Error`, `Critical`, and `System` count as blocking
//!    ([`ErrorLevel::is_error`]); `Info` and `Warning` are informational and
//!    never prevent a write.
//! 3. A passing [`ValidationResult`] carries no message; a failing one always
//!    carries both a message and a level.

use std::fmt;

/// Severity attached to a validation failure, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorLevel {
    /// Informational note; never blocks a write.
    Info,
    /// Advisory warning; never blocks a write.
    Warning,
    /// Standard validation error.
    Error,
    /// Severe error.
    Critical,
    /// System-level failure.
    System,
}

impl ErrorLevel {
    /// Whether this level blocks a write.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Critical | Self::System)
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

/// Outcome of a single validator invocation: pass, or fail with a message
/// and a severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    failure: Option<(String, ErrorLevel)>,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub const fn ok() -> Self {
        Self { failure: None }
    }

    /// A failing result at [`ErrorLevel::Error`].
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::create(message, ErrorLevel::Error)
    }

    /// A failing result at an explicit level.
    #[must_use]
    pub fn create(message: impl Into<String>, level: ErrorLevel) -> Self {
        Self {
            failure: Some((message.into(), level)),
        }
    }

    /// Whether the result passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }

    /// Whether the result fails at a blocking level.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(&self.failure, Some((_, level)) if level.is_error())
    }

    /// The failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.failure.as_ref().map(|(m, _)| m.as_str())
    }

    /// The failure level, if any.
    #[must_use]
    pub fn error_level(&self) -> Option<ErrorLevel> {
        self.failure.as_ref().map(|(_, l)| *l)
    }
}

/// A conversion failure: a human-readable message plus a severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    message: String,
    level: ErrorLevel,
}

impl ValueError {
    /// A failure at [`ErrorLevel::Error`].
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_level(message, ErrorLevel::Error)
    }

    /// A failure at an explicit level.
    #[must_use]
    pub fn with_level(message: impl Into<String>, level: ErrorLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The failure level.
    #[must_use]
    pub fn level(&self) -> ErrorLevel {
        self.level
    }

    /// View this failure as a [`ValidationResult`].
    #[must_use]
    pub fn to_result(&self) -> ValidationResult {
        ValidationResult::create(self.message.clone(), self.level)
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

impl std::error::Error for ValueError {}

/// Result of one model-direction conversion step.
pub type ConversionResult<M> = Result<M, ValueError>;
