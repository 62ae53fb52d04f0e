#![forbid(unsafe_code)]

//! Bidirectional value conversion.
//!
//! A [`Converter`] transforms between a field's presentation type `P` and a
//! model type `M`. The model direction may fail with a [`ValueError`]; the
//! presentation direction is total.
//!
//! Converters compose with [`Chained`]: `A` then `B` runs `A.to_model`
//! followed by `B.to_model`, and reverses the order on `to_presentation`.
//!
//! # Invariants
//!
//! 1. `to_model` short-circuits: once a stage fails, later stages never run.
//! 2. `to_presentation` has no failure channel; a stage that cannot be total
//!    must substitute a caller-supplied fallback value.
//! 3. Chaining is associative: `(A∘B)∘C` and `A∘(B∘C)` produce identical
//!    pipelines.

use std::marker::PhantomData;
use std::rc::Rc;

use crate::context::ValueContext;
use crate::validation::ConversionResult;

/// Bidirectional transformer between a presentation type `P` and a model
/// type `M`.
pub trait Converter<P, M> {
    /// Convert a presentation value to a model value, or fail with a
    /// human-readable message.
    fn to_model(&self, value: P, ctx: &ValueContext) -> ConversionResult<M>;

    /// Convert a model value to a presentation value. Total by contract.
    fn to_presentation(&self, value: M, ctx: &ValueContext) -> P;
}

impl<P, M, C: Converter<P, M> + ?Sized> Converter<P, M> for Box<C> {
    fn to_model(&self, value: P, ctx: &ValueContext) -> ConversionResult<M> {
        (**self).to_model(value, ctx)
    }

    fn to_presentation(&self, value: M, ctx: &ValueContext) -> P {
        (**self).to_presentation(value, ctx)
    }
}

impl<P, M, C: Converter<P, M> + ?Sized> Converter<P, M> for Rc<C> {
    fn to_model(&self, value: P, ctx: &ValueContext) -> ConversionResult<M> {
        (**self).to_model(value, ctx)
    }

    fn to_presentation(&self, value: M, ctx: &ValueContext) -> P {
        (**self).to_presentation(value, ctx)
    }
}

/// The identity converter: presentation and model types coincide.
pub struct Identity<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T> Identity<T> {
    /// Create an identity converter.
    #[must_use]
    pub fn new() -> Self {
        Self { _value: PhantomData }
    }
}

impl<T> Default for Identity<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Converter<T, T> for Identity<T> {
    fn to_model(&self, value: T, _ctx: &ValueContext) -> ConversionResult<T> {
        Ok(value)
    }

    fn to_presentation(&self, value: T, _ctx: &ValueContext) -> T {
        value
    }
}

/// Two converters composed into one, `first` feeding `second` on the model
/// direction and the reverse on the presentation direction.
pub struct Chained<C1, C2, X> {
    first: C1,
    second: C2,
    _mid: PhantomData<fn() -> X>,
}

impl<C1, C2, X> Chained<C1, C2, X> {
    /// Compose `first` with `second`.
    #[must_use]
    pub fn new(first: C1, second: C2) -> Self {
        Self {
            first,
            second,
            _mid: PhantomData,
        }
    }
}

impl<P, X, M, C1, C2> Converter<P, M> for Chained<C1, C2, X>
where
    C1: Converter<P, X>,
    C2: Converter<X, M>,
{
    fn to_model(&self, value: P, ctx: &ValueContext) -> ConversionResult<M> {
        let mid = self.first.to_model(value, ctx)?;
        self.second.to_model(mid, ctx)
    }

    fn to_presentation(&self, value: M, ctx: &ValueContext) -> P {
        let mid = self.second.to_presentation(value, ctx);
        self.first.to_presentation(mid, ctx)
    }
}

/// A converter assembled from a pair of closures.
pub struct FnConverter<F, G> {
    to_model: F,
    to_presentation: G,
}

impl<P, M, F, G> Converter<P, M> for FnConverter<F, G>
where
    F: Fn(P, &ValueContext) -> ConversionResult<M>,
    G: Fn(M, &ValueContext) -> P,
{
    fn to_model(&self, value: P, ctx: &ValueContext) -> ConversionResult<M> {
        (self.to_model)(value, ctx)
    }

    fn to_presentation(&self, value: M, ctx: &ValueContext) -> P {
        (self.to_presentation)(value, ctx)
    }
}

/// Build a converter from a fallible model-direction closure and a total
/// presentation-direction closure.
pub fn from_fns<P, M, F, G>(to_model: F, to_presentation: G) -> FnConverter<F, G>
where
    F: Fn(P, &ValueContext) -> ConversionResult<M>,
    G: Fn(M, &ValueContext) -> P,
{
    FnConverter {
        to_model,
        to_presentation,
    }
}
