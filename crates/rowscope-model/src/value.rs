use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A single cell of a dataset row.
///
/// Serialized untagged so rows render as plain JSON arrays (`["A", 12, null]`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    Number(f64),
    String(Arc<str>),
}

/// Hashable identity of a [`Value`].
///
/// Equality follows same-value-zero semantics: `NaN` equals `NaN` and `-0.0`
/// equals `0.0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Number(OrderedFloat<f64>),
    String(Arc<str>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Number(n) if *n == 0.0 => ValueKey::Number(OrderedFloat(0.0)),
            Value::Number(n) => ValueKey::Number(OrderedFloat(*n)),
            Value::String(s) => ValueKey::String(s.clone()),
        }
    }

    /// String form used to key occurrence counts. Nulls map to the literal `"null"`.
    pub fn count_key(&self) -> String {
        self.to_string()
    }

    /// Ascending order used when sorting collected values.
    ///
    /// Numbers compare numerically and strings lexicographically. Numbers sort
    /// before strings and nulls sort last.
    pub fn ascending_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Number(_), Value::String(_)) => Ordering::Less,
            (Value::String(_), Value::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) => f.write_str(s),
            Value::Number(n) if n.is_nan() => f.write_str("NaN"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // `-0` prints as `0`.
            Value::Number(n) if *n == 0.0 => f.write_str("0"),
            // Exponent form outside [1e-6, 1e21), as in `1e+21` and `1.5e-7`.
            Value::Number(n) if n.abs() >= 1e21 || n.abs() < 1e-6 => {
                let sci = format!("{n:e}");
                match sci.split_once('e') {
                    Some((mantissa, exp)) if !exp.starts_with('-') => {
                        write!(f, "{mantissa}e+{exp}")
                    }
                    _ => f.write_str(&sci),
                }
            }
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
