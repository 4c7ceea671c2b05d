//! The closed set of value types a property can hold.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PropertyError;

/// A property value.
///
/// A closed tagged union over the types the property surface actually
/// carries; there is no unrestricted type erasure. Typed extraction goes
/// through [`FromValue`] and fails with
/// [`PropertyError::BadPropertyType`] on a variant mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Double-precision float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Exact ratio, e.g. frame rate or sample aspect (numerator, denominator).
    Rational(i64, i64),
    /// Vector of integers.
    IntVec(Vec<i64>),
    /// Vector of doubles.
    DoubleVec(Vec<f64>),
    /// Vector of strings.
    StringVec(Vec<String>),
}

/// Discriminant of a [`Value`], used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// See [`Value::Bool`].
    Bool,
    /// See [`Value::Int`].
    Int,
    /// See [`Value::Double`].
    Double,
    /// See [`Value::String`].
    String,
    /// See [`Value::Rational`].
    Rational,
    /// See [`Value::IntVec`].
    IntVec,
    /// See [`Value::DoubleVec`].
    DoubleVec,
    /// See [`Value::StringVec`].
    StringVec,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
            Self::Rational => "rational",
            Self::IntVec => "int-vec",
            Self::DoubleVec => "double-vec",
            Self::StringVec => "string-vec",
        };
        f.write_str(name)
    }
}

impl Value {
    /// The discriminant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Double(_) => ValueKind::Double,
            Self::String(_) => ValueKind::String,
            Self::Rational(..) => ValueKind::Rational,
            Self::IntVec(_) => ValueKind::IntVec,
            Self::DoubleVec(_) => ValueKind::DoubleVec,
            Self::StringVec(_) => ValueKind::StringVec,
        }
    }

    /// Parse `input` into a value of kind `kind`.
    ///
    /// Rationals accept `num:den`; vector kinds split on whitespace and
    /// commas.
    pub fn parse_as(kind: ValueKind, input: &str) -> Result<Self, PropertyError> {
        let parse_err = |expected: ValueKind| PropertyError::Parse {
            input: input.to_owned(),
            expected,
        };

        let value = match kind {
            ValueKind::Bool => match input.trim() {
                "true" | "1" => Self::Bool(true),
                "false" | "0" => Self::Bool(false),
                _ => return Err(parse_err(ValueKind::Bool)),
            },
            ValueKind::Int => Self::Int(
                input
                    .trim()
                    .parse()
                    .map_err(|_| parse_err(ValueKind::Int))?,
            ),
            ValueKind::Double => Self::Double(
                input
                    .trim()
                    .parse()
                    .map_err(|_| parse_err(ValueKind::Double))?,
            ),
            ValueKind::String => Self::String(input.to_owned()),
            ValueKind::Rational => {
                let (num, den) = input
                    .trim()
                    .split_once(':')
                    .ok_or_else(|| parse_err(ValueKind::Rational))?;
                Self::Rational(
                    num.parse().map_err(|_| parse_err(ValueKind::Rational))?,
                    den.parse().map_err(|_| parse_err(ValueKind::Rational))?,
                )
            }
            ValueKind::IntVec => Self::IntVec(
                split_list(input)
                    .map(|tok| tok.parse().map_err(|_| parse_err(ValueKind::IntVec)))
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::DoubleVec => Self::DoubleVec(
                split_list(input)
                    .map(|tok| tok.parse().map_err(|_| parse_err(ValueKind::DoubleVec)))
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::StringVec => {
                Self::StringVec(split_list(input).map(str::to_owned).collect())
            }
        };
        Ok(value)
    }
}

fn split_list(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tok| !tok.is_empty())
}

/// Extraction of a concrete type out of a [`Value`].
pub trait FromValue: Sized {
    /// The variant this type extracts from.
    fn kind() -> ValueKind;

    /// Extract, returning `None` on a variant mismatch.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_value_conv {
    ($ty:ty, $kind:ident, $pat:pat => $extract:expr) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$kind(v)
            }
        }

        impl FromValue for $ty {
            fn kind() -> ValueKind {
                ValueKind::$kind
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    $pat => Some($extract),
                    _ => None,
                }
            }
        }
    };
}

impl_value_conv!(bool, Bool, Value::Bool(v) => *v);
impl_value_conv!(i64, Int, Value::Int(v) => *v);
impl_value_conv!(f64, Double, Value::Double(v) => *v);
impl_value_conv!(String, String, Value::String(v) => v.clone());
impl_value_conv!(Vec<i64>, IntVec, Value::IntVec(v) => v.clone());
impl_value_conv!(Vec<f64>, DoubleVec, Value::DoubleVec(v) => v.clone());
impl_value_conv!(Vec<String>, StringVec, Value::StringVec(v) => v.clone());

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<(i64, i64)> for Value {
    fn from((num, den): (i64, i64)) -> Self {
        Self::Rational(num, den)
    }
}

impl FromValue for (i64, i64) {
    fn kind() -> ValueKind {
        ValueKind::Rational
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Rational(num, den) => Some((*num, *den)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Bool(true), ValueKind::Bool)]
    #[case(Value::Int(3), ValueKind::Int)]
    #[case(Value::Double(0.5), ValueKind::Double)]
    #[case(Value::Rational(25, 1), ValueKind::Rational)]
    #[case(Value::String("x".into()), ValueKind::String)]
    fn kind_matches_variant(#[case] value: Value, #[case] kind: ValueKind) {
        assert_eq!(value.kind(), kind);
    }

    #[test]
    fn typed_extraction() {
        let v = Value::from(42i64);
        assert_eq!(i64::from_value(&v), Some(42));
        assert_eq!(bool::from_value(&v), None);
    }

    #[test]
    fn rational_round_trip() {
        let v = Value::from((30000i64, 1001i64));
        assert_eq!(<(i64, i64)>::from_value(&v), Some((30000, 1001)));
    }

    #[rstest]
    #[case(ValueKind::Bool, "true", Value::Bool(true))]
    #[case(ValueKind::Bool, "0", Value::Bool(false))]
    #[case(ValueKind::Int, " -7 ", Value::Int(-7))]
    #[case(ValueKind::Double, "1.5", Value::Double(1.5))]
    #[case(ValueKind::Rational, "30000:1001", Value::Rational(30000, 1001))]
    #[case(ValueKind::IntVec, "1, 2 3", Value::IntVec(vec![1, 2, 3]))]
    #[case(
        ValueKind::StringVec,
        "a b,c",
        Value::StringVec(vec!["a".into(), "b".into(), "c".into()])
    )]
    fn parse_as_accepts(#[case] kind: ValueKind, #[case] input: &str, #[case] expected: Value) {
        assert_eq!(Value::parse_as(kind, input).unwrap(), expected);
    }

    #[rstest]
    #[case(ValueKind::Bool, "yes")]
    #[case(ValueKind::Int, "1.5")]
    #[case(ValueKind::Rational, "25")]
    fn parse_as_rejects(#[case] kind: ValueKind, #[case] input: &str) {
        assert!(Value::parse_as(kind, input).is_err());
    }

    #[test]
    fn serde_round_trip() {
        let v = Value::Rational(25, 1);
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
