#![forbid(unsafe_code)]

//! Stock converters.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::context::ValueContext;
use crate::converter::Converter;
use crate::validation::{ConversionResult, ValueError};

/// Converts a string presentation to any [`FromStr`] number type, trimming
/// surrounding whitespace on input.
pub struct StringToNumber<N> {
    message: String,
    _number: PhantomData<fn() -> N>,
}

impl<N> StringToNumber<N> {
    /// Create a converter failing with `message` on unparseable input.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            _number: PhantomData,
        }
    }
}

impl<N: FromStr + Display> Converter<String, N> for StringToNumber<N> {
    fn to_model(&self, value: String, _ctx: &ValueContext) -> ConversionResult<N> {
        value
            .trim()
            .parse()
            .map_err(|_| ValueError::new(self.message.clone()))
    }

    fn to_presentation(&self, value: N, _ctx: &ValueContext) -> String {
        value.to_string()
    }
}

/// Converts the strings `"true"` / `"false"` (case-insensitive, trimmed)
/// to a boolean.
pub struct StringToBool {
    message: String,
}

impl StringToBool {
    /// Create a converter failing with `message` on anything else.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Converter<String, bool> for StringToBool {
    fn to_model(&self, value: String, _ctx: &ValueContext) -> ConversionResult<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ValueError::new(self.message.clone())),
        }
    }

    fn to_presentation(&self, value: bool, _ctx: &ValueContext) -> String {
        value.to_string()
    }
}

/// Trims surrounding whitespace on the model direction; identity on the
/// presentation direction. A normalizing converter: after a successful write
/// the trimmed value is pushed back into the field.
pub struct TrimConverter;

impl Converter<String, String> for TrimConverter {
    fn to_model(&self, value: String, _ctx: &ValueContext) -> ConversionResult<String> {
        Ok(value.trim().to_owned())
    }

    fn to_presentation(&self, value: String, _ctx: &ValueContext) -> String {
        value
    }
}

/// Maps a designated "empty" presentation value to `None` and everything
/// else to `Some`, substituting the representation back on the way out.
///
/// Attaching this converter is the explicit opt-in for absent model values;
/// it overrides the generic empty-value substitution a binding would
/// otherwise apply.
pub struct NullRepresentationConverter<T> {
    representation: T,
}

impl<T> NullRepresentationConverter<T> {
    /// Use `representation` as the presentation of an absent model value.
    #[must_use]
    pub fn new(representation: T) -> Self {
        Self { representation }
    }
}

impl<T: Clone + PartialEq> Converter<T, Option<T>> for NullRepresentationConverter<T> {
    fn to_model(&self, value: T, _ctx: &ValueContext) -> ConversionResult<Option<T>> {
        if value == self.representation {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }

    fn to_presentation(&self, value: Option<T>, _ctx: &ValueContext) -> T {
        value.unwrap_or_else(|| self.representation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn string_to_number_trims() {
        let conv = StringToNumber::<i32>::new("not a number");
        let ctx = ValueContext::new();
        assert_eq!(conv.to_model("  42 ".to_string(), &ctx), Ok(42));
    }

    #[test]
    fn string_to_number_reports_failure() {
        let conv = StringToNumber::<i32>::new("not a number");
        let ctx = ValueContext::new();
        let err = conv.to_model("abc".to_string(), &ctx).unwrap_err();
        assert_eq!(err.message(), "not a number");
    }

    #[test]
    fn string_to_bool_is_case_insensitive() {
        let conv = StringToBool::new("not a boolean");
        let ctx = ValueContext::new();
        assert_eq!(conv.to_model(" TRUE ".to_string(), &ctx), Ok(true));
        assert_eq!(conv.to_model("False".to_string(), &ctx), Ok(false));
        assert!(conv.to_model("yes".to_string(), &ctx).is_err());
    }

    #[test]
    fn trim_normalizes_model_direction_only() {
        let ctx = ValueContext::new();
        assert_eq!(
            TrimConverter.to_model(" a ".to_string(), &ctx),
            Ok("a".to_string())
        );
        assert_eq!(TrimConverter.to_presentation("a".to_string(), &ctx), "a");
    }

    #[test]
    fn null_representation_maps_both_ways() {
        let conv = NullRepresentationConverter::new(String::new());
        let ctx = ValueContext::new();
        assert_eq!(conv.to_model(String::new(), &ctx), Ok(None));
        assert_eq!(
            conv.to_model("x".to_string(), &ctx),
            Ok(Some("x".to_string()))
        );
        assert_eq!(conv.to_presentation(None, &ctx), "");
        assert_eq!(conv.to_presentation(Some("x".to_string()), &ctx), "x");
    }

    proptest! {
        // Lossless stage: to_presentation(to_model(x)) == canonical form of x.
        #[test]
        fn number_round_trip(n in any::<i64>()) {
            let conv = StringToNumber::<i64>::new("bad");
            let ctx = ValueContext::new();
            let model = conv.to_model(n.to_string(), &ctx).unwrap();
            prop_assert_eq!(conv.to_presentation(model, &ctx), n.to_string());
        }
    }
}
