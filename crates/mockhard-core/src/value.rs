//! Dynamic values carried as call arguments and return values, plus the
//! matching primitive every lookup goes through.
//!
//! Matching is deliberately shallow: two values match when they are strictly
//! equal, or when both are sequences of the same length whose elements are
//! pairwise strictly equal. Lists and objects nested inside a sequence are
//! compared by identity, never structurally.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A dynamically typed argument or return value.
///
/// `List` and `Object` are reference values: cloning shares the underlying
/// allocation, and strict equality compares allocations, not contents.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<[Value]>),
    Object(Arc<BTreeMap<String, Value>>),
}

impl Value {
    /// Build a list value.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Build an object value from key/value pairs.
    #[must_use]
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// `Undefined` or `Null`.
    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Sequence length, if the value has one. Strings count chars.
    #[must_use]
    pub fn length(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::List(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Strict equality: primitives by value, lists and objects by identity.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => {
                int_eq_float(*a, *b)
            }
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Render as JSON for logs and reports.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Str(s) => serde_json::Value::String(s.to_string()),
            Self::List(items) => items.iter().map(Self::to_json).collect(),
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// The matching primitive used for both argument tuples and return values.
///
/// Strict equality short-circuits. Nullish operands never match anything but
/// themselves. Otherwise both operands need a length, lengths must agree, and
/// every element must be strictly equal. Scalars that are not strictly equal
/// have no length and therefore do not match.
#[must_use]
pub fn really_equal(a: &Value, b: &Value) -> bool {
    if a.strict_eq(b) {
        return true;
    }
    if a.is_nullish() || b.is_nullish() {
        return false;
    }
    match (a, b) {
        (Value::List(x), Value::List(y)) => args_equal(x, y),
        (Value::Str(s), Value::List(items)) | (Value::List(items), Value::Str(s)) => {
            s.chars().count() == items.len()
                && s.chars().zip(items.iter()).all(|(c, item)| char_matches(c, item))
        }
        _ => false,
    }
}

/// Argument tuples: same length, element-wise strict equality.
#[must_use]
pub fn args_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
}

// Exact numeric equality: the float must be integral and inside `i64` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn int_eq_float(int: i64, float: f64) -> bool {
    // 2^63 is exactly representable; i64::MAX as f64 rounds up to it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    float.fract() == 0.0 && (-LIMIT..LIMIT).contains(&float) && int == float as i64
}

fn char_matches(c: char, item: &Value) -> bool {
    match item {
        Value::Str(s) => {
            let mut chars = s.chars();
            chars.next() == Some(c) && chars.next().is_none()
        }
        _ => false,
    }
}

/// Comma-joined rendering of an argument tuple.
#[must_use]
pub fn render_args(args: &[Value]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// `method(a,b) => r`, or `method(a,b)` when no return value is known.
#[must_use]
pub fn signature(method: &str, args: &[Value], return_value: Option<&Value>) -> String {
    let mut out = format!("{method}({})", render_args(args));
    if let Some(value) = return_value {
        out.push_str(" => ");
        out.push_str(&value.to_string());
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => f.write_str(&render_args(items)),
            Self::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Build an argument tuple: `args!["a", 1, true]`.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
