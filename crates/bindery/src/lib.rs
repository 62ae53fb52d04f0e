#![forbid(unsafe_code)]

//! Form data binding: fields on one side, beans and records on the other.
//!
//! A [`Binder`] groups [`Binding`]s toward one target type. Each binding
//! carries a converter/validator chain between its field's presentation
//! value and a model value, assembled with [`BindingBuilder`] and completed
//! against explicit accessors, a named property, or a record component.
//!
//! ```
//! use bindery::{Binder, Field, InputField, StringToNumber, not_blank};
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! let name = InputField::new(String::new()).with_label("Name");
//! let age = InputField::new(String::new()).with_label("Age");
//!
//! let binder = Binder::<Person>::new();
//! binder
//!     .for_field(&name)
//!     .with_validator(not_blank("name is required"))
//!     .bind(|p| p.name.clone(), |p, v| p.name = v);
//! binder
//!     .for_field(&age)
//!     .with_converter(StringToNumber::<i32>::new("age must be a number"))
//!     .bind(|p| p.age, |p, v| p.age = v);
//!
//! name.set_value("Ada".to_owned());
//! age.set_value("36".to_owned());
//!
//! let mut person = Person::default();
//! binder.write_bean(&mut person).unwrap();
//! assert_eq!(person.age, 36);
//! ```
//!
//! The engine is single-threaded by design: state is shared through
//! `Rc`/`RefCell`, matching its place inside a UI event loop.

pub mod binder;
pub mod binding;
pub mod instance_fields;
pub mod record;
pub mod status;

pub use binder::{Binder, BindingHandle};
pub use binding::{Binding, BindingBuilder, BindingId};
pub use instance_fields::{ConverterFactory, InstanceField};
pub use record::{RecordComponents, RecordSchema};
pub use status::{
    BinderError, BinderValidationStatus, BindingValidationStatus, ValidationException,
    WriteRecordError,
};

pub use bindery_core::{
    Chained, ConversionResult, Converter, DynValue, ErrorLevel, Field, FieldId, FnConverter,
    FnValidator, Identity, InputField, NullRepresentationConverter, RangeValidator,
    StringLengthValidator, StringToBool, StringToNumber, Subscription, TrimConverter,
    ValidationResult, Validator, ValidatorStage, ValueContext, ValueError, from_fn, from_fns,
    not_blank,
};
pub use bindery_props::{
    HasPropertySet, PropertyDefinition, PropertyError, PropertySet, PropertySetBuilder,
    ScanOptions, property_set_for, property_set_with,
};
