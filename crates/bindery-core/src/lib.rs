#![forbid(unsafe_code)]

//! Value pipeline primitives for Bindery.
//!
//! This crate provides the pieces a binding is assembled from:
//! - [`Converter`] for bidirectional presentation ↔ model conversion,
//!   composable into chains via [`Chained`].
//! - [`Validator`] for pass/fail checks with an [`ErrorLevel`] severity,
//!   foldable into a converter chain as a value-preserving [`ValidatorStage`].
//! - [`Field`] as the abstraction over a UI input, with [`InputField`] as a
//!   toolkit-independent reference implementation.
//! - [`DynValue`] as the type-erased value flowing through property tables.
//!
//! Everything here is single-threaded by design: fields share state through
//! `Rc<RefCell<..>>`, subscriptions are RAII guards, and no locking exists
//! anywhere in the pipeline.

pub mod context;
pub mod converter;
pub mod converters;
pub mod dyn_value;
pub mod field;
pub mod validation;
pub mod validator;
pub mod validators;

pub use context::ValueContext;
pub use converter::{Chained, Converter, FnConverter, Identity, from_fns};
pub use converters::{NullRepresentationConverter, StringToBool, StringToNumber, TrimConverter};
pub use dyn_value::DynValue;
pub use field::{Field, FieldId, InputField, Subscription};
pub use validation::{ConversionResult, ErrorLevel, ValidationResult, ValueError};
pub use validator::{FnValidator, Validator, ValidatorStage, from_fn};
pub use validators::{RangeValidator, StringLengthValidator, not_blank};
