//! Call arguments as seen by key derivation
//!
//! Every argument handed to a cached function is classified once, at the call
//! boundary, into one of three shapes: a primitive, an ordered sequence or a
//! keyed mapping. Key derivation then dispatches on that shape.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// A single call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// An absent value (`None`)
    Undefined,
    /// An explicit null
    Null,
    /// A boolean
    Bool(bool),
    /// A number
    Number(Number),
    /// A string
    String(String),
    /// An ordered sequence of values
    Sequence(Vec<Arg>),
    /// A keyed mapping, ordered by key
    Mapping(BTreeMap<String, Arg>),
}

impl Arg {
    /// Convert any serializable value into an argument
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::from)
            .map_err(|e| Error::serialization(format!("Failed to encode argument: {e}")))
    }

    /// Convert back into a JSON value, mapping `Undefined` to `null`
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Undefined | Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Sequence(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            Self::Mapping(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        // serde_json cannot hold NaN or infinities; keep their textual form
        Number::from_f64(value).map_or_else(
            || {
                Self::String(if value.is_nan() {
                    "NaN".to_string()
                } else if value.is_sign_positive() {
                    "Infinity".to_string()
                } else {
                    "-Infinity".to_string()
                })
            },
            Self::Number,
        )
    }
}

impl From<f32> for Arg {
    fn from(value: f32) -> Self {
        Self::from(f64::from(value))
    }
}

impl<T: Into<Self>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Arg {
    fn from(value: Vec<T>) -> Self {
        Self::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<BTreeMap<String, T>> for Arg {
    fn from(value: BTreeMap<String, T>) -> Self {
        Self::Mapping(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Build an argument list from heterogeneous values
///
/// ```
/// use fncache::{Arg, args};
///
/// let list = args![1, "x", None::<i32>, 22];
/// assert_eq!(list.len(), 4);
/// assert_eq!(list[2], Arg::Undefined);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($value)),+]
    };
}
