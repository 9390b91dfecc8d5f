//! Value model: the tagged union stored in every setting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tree::SettingId;

/// The fixed tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Ordered mapping of uniquely named settings.
    Group,
    /// Ordered, heterogeneous sequence.
    List,
    /// Ordered sequence of scalars sharing one kind.
    Array,
}

impl Kind {
    /// Returns the lowercase name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Group => "group",
            Self::List => "list",
            Self::Array => "array",
        }
    }

    /// Returns `true` for int, float, bool and string.
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Bool | Self::String)
    }

    /// Returns `true` for group, list and array.
    pub fn is_aggregate(self) -> bool {
        !self.is_scalar()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a kind name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown setting kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "int64" | "integer" => Ok(Self::Int),
            "float" | "float64" | "double" => Ok(Self::Float),
            "bool" | "boolean" => Ok(Self::Bool),
            "string" | "str" => Ok(Self::String),
            "group" => Ok(Self::Group),
            "list" => Ok(Self::List),
            "array" => Ok(Self::Array),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// Child ids of an aggregate setting, in document order.
///
/// Only the tree can add entries, so a value built outside a tree is always
/// an empty aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub(crate) Vec<SettingId>);

impl Children {
    /// Number of children.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no children.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates child ids in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = SettingId> + '_ {
        self.0.iter().copied()
    }

    /// Returns the id at `index`.
    pub fn get(&self, index: usize) -> Option<SettingId> {
        self.0.get(index).copied()
    }
}

/// Payload of a setting.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Group(Children),
    List(Children),
    Array(Children),
}

impl Value {
    /// Creates the zero/empty value of `kind`.
    pub fn default_for(kind: Kind) -> Self {
        match kind {
            Kind::Int => Self::Int(0),
            Kind::Float => Self::Float(0.0),
            Kind::Bool => Self::Bool(false),
            Kind::String => Self::String(String::new()),
            Kind::Group => Self::Group(Children::default()),
            Kind::List => Self::List(Children::default()),
            Kind::Array => Self::Array(Children::default()),
        }
    }

    /// Returns the kind tag.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::Bool(_) => Kind::Bool,
            Self::String(_) => Kind::String,
            Self::Group(_) => Kind::Group,
            Self::List(_) => Kind::List,
            Self::Array(_) => Kind::Array,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the children of an aggregate, `None` for scalars.
    pub fn children(&self) -> Option<&Children> {
        match self {
            Self::Group(c) | Self::List(c) | Self::Array(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Children> {
        match self {
            Self::Group(c) | Self::List(c) | Self::Array(c) => Some(c),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// Scalar types that can be read out of a setting with an exact kind check.
pub trait FromValue: Sized {
    /// The only kind this type can be read from.
    const KIND: Kind;

    /// Extracts the payload, or `None` if `value` has another kind.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    const KIND: Kind = Kind::Int;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for f64 {
    const KIND: Kind = Kind::Float;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for bool {
    const KIND: Kind = Kind::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    const KIND: Kind = Kind::String;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

/// Scalar types that can be written into an existing setting.
pub trait IntoValue {
    /// The kind the target setting must already have.
    const KIND: Kind;

    fn into_value(self) -> Value;
}

macro_rules! impl_into_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                const KIND: Kind = Kind::$kind;

                fn into_value(self) -> Value {
                    Value::from(self)
                }
            }
        )*
    };
}

impl_into_value! {
    i64 => Int,
    i32 => Int,
    f64 => Float,
    bool => Bool,
    String => String,
    &str => String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payloads() {
        assert_eq!(Value::default_for(Kind::Int), Value::Int(0));
        assert_eq!(Value::default_for(Kind::Float), Value::Float(0.0));
        assert_eq!(Value::default_for(Kind::Bool), Value::Bool(false));
        assert_eq!(Value::default_for(Kind::String), Value::String(String::new()));
        for kind in [Kind::Group, Kind::List, Kind::Array] {
            let value = Value::default_for(kind);
            assert_eq!(value.kind(), kind);
            assert!(value.children().is_some_and(Children::is_empty));
        }
    }

    #[test]
    fn test_no_numeric_coercion() {
        let value = Value::Float(3.0);
        assert_eq!(i64::from_value(&value), None);
        assert_eq!(f64::from_value(&value), Some(3.0));

        let value = Value::Int(3);
        assert_eq!(f64::from_value(&value), None);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("INT".parse::<Kind>(), Ok(Kind::Int));
        assert_eq!("boolean".parse::<Kind>(), Ok(Kind::Bool));
        assert_eq!("Group".parse::<Kind>(), Ok(Kind::Group));
        assert!("object".parse::<Kind>().is_err());
    }

    #[test]
    fn test_kind_round_trips_through_display() {
        for kind in [
            Kind::Int,
            Kind::Float,
            Kind::Bool,
            Kind::String,
            Kind::Group,
            Kind::List,
            Kind::Array,
        ] {
            assert_eq!(kind.to_string().parse::<Kind>(), Ok(kind));
        }
    }

    #[test]
    fn test_into_value_kinds() {
        assert_eq!(<i32 as IntoValue>::KIND, Kind::Int);
        assert_eq!("x".into_value(), Value::String("x".into()));
        assert_eq!(7i32.into_value(), Value::Int(7));
    }
}
