#![forbid(unsafe_code)]

//! Named property resolution for Bindery.
//!
//! Rust has no runtime reflection, so bean types describe themselves through
//! manually-registered accessor tables: a [`PropertySet`] maps property names
//! (including dotted nested paths like `"address.street"`) to
//! [`PropertyDefinition`]s carrying type-erased getter/setter pairs.
//!
//! Property sets are cached per `(type, scan options)` in a thread-local
//! registry, and dotted paths materialize lazily into the owning set on
//! first resolution.

pub mod definition;
pub mod registry;
pub mod set;

pub use definition::{PropertyDefinition, PropertyError};
pub use registry::{HasPropertySet, property_set_for, property_set_with};
pub use set::{PropertySet, PropertySetBuilder, ScanOptions};
