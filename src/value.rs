//! Semantic values and the coercions that produce them from raw fields.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A coerced field value or a comparison value.
///
/// Numbers compare across `Integer` and `Float`. Values of otherwise
/// different variants are unordered and unequal.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    List(Vec<Value>),
}

impl Value {
    /// Membership test: `self` is the container, `item` the candidate.
    ///
    /// Lists test element equality, text tests substring containment.
    pub fn contains(&self, item: &Value) -> bool {
        match (self, item) {
            (Value::List(items), _) => items.iter().any(|v| v == item),
            (Value::Text(haystack), Value::Text(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::List(a), Value::List(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Signature of a caller-supplied field conversion.
pub type CoerceFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// How a template turns a raw field string into a [`Value`].
#[derive(Clone)]
pub enum ValueType {
    Text,
    Integer,
    Float,
    /// A named conversion supplied by the caller.
    Custom {
        name: String,
        coerce: Arc<CoerceFn>,
    },
}

impl ValueType {
    pub fn custom<F>(name: impl Into<String>, coerce: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        ValueType::Custom {
            name: name.into(),
            coerce: Arc::new(coerce),
        }
    }

    /// Convert a raw field. The error string describes why it failed.
    pub fn coerce(&self, raw: &str) -> Result<Value, String> {
        match self {
            ValueType::Text => Ok(Value::Text(raw.to_string())),
            ValueType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| e.to_string()),
            ValueType::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| e.to_string()),
            ValueType::Custom { coerce, .. } => coerce(raw),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ValueType::Text => "text",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Custom { name, .. } => name,
        }
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueType({})", self.name())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "str" | "string" => Ok(ValueType::Text),
            "int" | "integer" => Ok(ValueType::Integer),
            "float" | "number" => Ok(ValueType::Float),
            other => Err(format!("Unknown value type: {other}")),
        }
    }
}
