//! Runtime values, domain types, and argument coercion.
//!
//! A [`Value`] is what a record hands back when an attribute is read. Query
//! arguments arrive as text and are turned into [`Literal`]s by [`coerce`],
//! using the attribute's declared [`DomainType`].

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a record attribute.
///
/// Drives argument coercion: query arguments are parsed into this type
/// before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    /// Textual attribute. Arguments are used as-is.
    Text,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// 32-bit floating point. Arguments are parsed as `f32`, so equality
    /// holds at the field's own precision.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Boolean. Coercion is lenient: only `true` (any case) is true.
    Bool,
    /// Anything else, read through its `Display` rendering.
    ///
    /// Comparison is textual, not type-based: `status==open` matches any
    /// value whose `Display` output is exactly `open`, even though the value
    /// itself is not a string. Two different values that render the same
    /// text are indistinguishable to queries.
    Other,
}

impl DomainType {
    pub fn as_str(self) -> &'static str {
        match self {
            DomainType::Text => "text",
            DomainType::Int32 => "int32",
            DomainType::Int64 => "int64",
            DomainType::Float32 => "float32",
            DomainType::Float64 => "float64",
            DomainType::Bool => "bool",
            DomainType::Other => "other",
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime value of an attribute, borrowed from the record where possible.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// Text value.
    Text(&'a str),
    /// 32-bit integer value.
    Int32(i32),
    /// 64-bit integer value.
    Int64(i64),
    /// 32-bit floating point value.
    Float32(f32),
    /// 64-bit floating point value.
    Float64(f64),
    /// Boolean value.
    Bool(bool),
    /// Value of an "other" attribute, rendered to text.
    Other(Cow<'a, str>),
    /// The attribute is declared but holds no value.
    Null,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts the text value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Other(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Tests this value against a coerced query literal.
    ///
    /// Values and literals of different kinds never match. Integer widths
    /// are compared numerically, so an `Int64` value matches an `Int32`
    /// literal with the same number.
    pub fn matches(&self, literal: &Literal<'_>) -> bool {
        match (self, literal) {
            (Value::Text(v), Literal::Text(l)) => v == l,
            (Value::Other(v), Literal::Text(l)) => v == l,
            (Value::Int32(v), Literal::Int32(l)) => v == l,
            (Value::Int64(v), Literal::Int64(l)) => v == l,
            (Value::Int32(v), Literal::Int64(l)) => i64::from(*v) == *l,
            (Value::Int64(v), Literal::Int32(l)) => *v == i64::from(*l),
            (Value::Float32(v), Literal::Float32(l)) => v == l,
            (Value::Float64(v), Literal::Float64(l)) => v == l,
            (Value::Bool(v), Literal::Bool(l)) => v == l,
            _ => false,
        }
    }
}

/// A query argument after coercion to a domain type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal<'q> {
    Text(&'q str),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
}

/// Why a single argument failed to coerce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionFailure<'q> {
    pub value: &'q str,
    pub target: DomainType,
}

/// Converts a textual argument to the given domain type.
///
/// Text and other attributes take the argument unchanged. Integer targets
/// reject overflow and non-numeric input. Boolean coercion never fails:
/// `true` in any case is true and everything else is false.
pub fn coerce_one(arg: &str, target: DomainType) -> Result<Literal<'_>, CoercionFailure<'_>> {
    let fail = || CoercionFailure { value: arg, target };
    match target {
        DomainType::Text | DomainType::Other => Ok(Literal::Text(arg)),
        DomainType::Int32 => arg.parse().map(Literal::Int32).map_err(|_| fail()),
        DomainType::Int64 => arg.parse().map(Literal::Int64).map_err(|_| fail()),
        DomainType::Float32 => arg.parse().map(Literal::Float32).map_err(|_| fail()),
        DomainType::Float64 => arg.parse().map(Literal::Float64).map_err(|_| fail()),
        DomainType::Bool => Ok(Literal::Bool(arg.eq_ignore_ascii_case("true"))),
    }
}

/// Converts every argument to the given domain type, stopping at the first failure.
pub fn coerce<'q, S: AsRef<str>>(
    args: &'q [S],
    target: DomainType,
) -> Result<Vec<Literal<'q>>, CoercionFailure<'q>> {
    args.iter()
        .map(|arg| coerce_one(arg.as_ref(), target))
        .collect()
}

/// Maps a Rust field type onto a [`DomainType`] and a runtime [`Value`].
///
/// Implemented for the common scalar types and for `Option<T>`, where
/// `None` reads as [`Value::Null`]. The `#[derive(Record)]` macro relies on
/// this trait to read fields.
pub trait AttributeValue {
    /// The domain type reported for attributes of this Rust type.
    const DOMAIN: DomainType;

    /// Reads the value.
    fn to_value(&self) -> Value<'_>;
}

impl AttributeValue for String {
    const DOMAIN: DomainType = DomainType::Text;
    fn to_value(&self) -> Value<'_> {
        Value::Text(self)
    }
}

impl AttributeValue for &str {
    const DOMAIN: DomainType = DomainType::Text;
    fn to_value(&self) -> Value<'_> {
        Value::Text(self)
    }
}

impl AttributeValue for Cow<'_, str> {
    const DOMAIN: DomainType = DomainType::Text;
    fn to_value(&self) -> Value<'_> {
        Value::Text(self)
    }
}

macro_rules! int32_attribute {
    ($($ty:ty),*) => {
        $(
            impl AttributeValue for $ty {
                const DOMAIN: DomainType = DomainType::Int32;
                fn to_value(&self) -> Value<'_> {
                    Value::Int32(i32::from(*self))
                }
            }
        )*
    };
}

macro_rules! int64_attribute {
    ($($ty:ty),*) => {
        $(
            impl AttributeValue for $ty {
                const DOMAIN: DomainType = DomainType::Int64;
                fn to_value(&self) -> Value<'_> {
                    Value::Int64(i64::from(*self))
                }
            }
        )*
    };
}

int32_attribute!(i8, i16, i32, u8, u16);
int64_attribute!(i64, u32);

impl AttributeValue for f32 {
    const DOMAIN: DomainType = DomainType::Float32;
    fn to_value(&self) -> Value<'_> {
        Value::Float32(*self)
    }
}

impl AttributeValue for f64 {
    const DOMAIN: DomainType = DomainType::Float64;
    fn to_value(&self) -> Value<'_> {
        Value::Float64(*self)
    }
}

impl AttributeValue for bool {
    const DOMAIN: DomainType = DomainType::Bool;
    fn to_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl<T: AttributeValue> AttributeValue for Option<T> {
    const DOMAIN: DomainType = T::DOMAIN;
    fn to_value(&self) -> Value<'_> {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

/// Reads a value of the "other" domain through its `Display` rendering.
pub fn display_value<T: fmt::Display + ?Sized>(value: &T) -> Value<'static> {
    Value::Other(Cow::Owned(value.to_string()))
}

/// Like [`display_value`], with `None` reading as [`Value::Null`].
pub fn display_option_value<T: fmt::Display>(value: &Option<T>) -> Value<'static> {
    match value {
        Some(v) => display_value(v),
        None => Value::Null,
    }
}
