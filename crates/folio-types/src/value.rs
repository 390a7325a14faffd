use std::fmt;

use serde::{Deserialize, Serialize};

/// The declared type of one field in a [`Schema`](crate::Schema).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// `true` / `false`.
    Boolean,
    /// Ordered sequence, stored as a JSON array.
    List,
    /// Key/value mapping, stored as a JSON object.
    Map,
    /// The inner type, or absent.
    Optional(Box<FieldType>),
}

impl FieldType {
    /// Wrap this type as optional. Optional types are never nested.
    pub fn optional(self) -> Self {
        match self {
            Self::Optional(_) => self,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Returns `true` if absent values are allowed.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// The type with any optional wrapper stripped.
    pub fn inner(&self) -> &FieldType {
        match self {
            Self::Optional(inner) => inner.inner(),
            other => other,
        }
    }

    /// Returns `true` for sequence and mapping types.
    pub fn is_structured(&self) -> bool {
        matches!(self.inner(), Self::List | Self::Map)
    }

    /// Whether `value` is a valid instance of this type.
    ///
    /// Integers are accepted where floats are declared; see
    /// [`normalize`](Self::normalize).
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Optional(_), Value::Null) => true,
            (Self::Optional(inner), v) => inner.accepts(v),
            (Self::Text, Value::Text(_)) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_) | Value::Integer(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::List, Value::Structured(serde_json::Value::Array(_))) => true,
            (Self::Map, Value::Structured(serde_json::Value::Object(_))) => true,
            _ => false,
        }
    }
}

impl FieldType {
    /// The canonical form of an accepted value: an integer given for a float
    /// field becomes a float, the form it has after a store round trip.
    /// Anything else is returned unchanged.
    pub fn normalize(&self, value: Value) -> Value {
        match (self.inner(), value) {
            (Self::Float, Value::Integer(i)) => Value::Float(i as f64),
            (_, value) => value,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::List => write!(f, "list"),
            Self::Map => write!(f, "map"),
            Self::Optional(inner) => write!(f, "{inner}?"),
        }
    }
}

/// A single field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value of an optional field.
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// A sequence or mapping.
    Structured(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, or integers widened to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Structured(serde_json::Value::Array(_)) => "list",
            Self::Structured(serde_json::Value::Object(_)) => "map",
            Self::Structured(_) => "json",
        }
    }

    /// Convert to a plain JSON value (for display and export).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Structured(v) => v.clone(),
        }
    }
}

/// Plain textual rendering: text is shown unquoted, structured values as
/// compact JSON, and `Null` as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Structured(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Structured(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::Structured(serde_json::Value::from(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_is_not_nested() {
        let t = FieldType::Text.optional().optional();
        assert_eq!(t, FieldType::Optional(Box::new(FieldType::Text)));
        assert_eq!(t.inner(), &FieldType::Text);
    }

    #[test]
    fn accepts_matches_declared_types() {
        assert!(FieldType::Text.accepts(&Value::from("a")));
        assert!(!FieldType::Text.accepts(&Value::Null));
        assert!(FieldType::Text.optional().accepts(&Value::Null));
        assert!(FieldType::Float.accepts(&Value::Integer(3)));
        assert!(!FieldType::Integer.accepts(&Value::Float(3.0)));
        assert!(FieldType::List.accepts(&Value::from(json!(["a", "b"]))));
        assert!(!FieldType::List.accepts(&Value::from(json!({"a": 1}))));
        assert!(FieldType::Map.optional().accepts(&Value::from(json!({"a": 1}))));
    }

    #[test]
    fn integers_normalize_to_floats_only_for_float_fields() {
        assert_eq!(FieldType::Float.normalize(Value::Integer(3)), Value::Float(3.0));
        assert_eq!(FieldType::Float.optional().normalize(Value::Integer(-2)), Value::Float(-2.0));
        assert_eq!(FieldType::Float.optional().normalize(Value::Null), Value::Null);
        assert_eq!(FieldType::Integer.normalize(Value::Integer(3)), Value::Integer(3));
        assert_eq!(FieldType::Text.normalize(Value::from("3")), Value::from("3"));
    }

    #[test]
    fn structured_detection_sees_through_optional() {
        assert!(FieldType::Map.optional().is_structured());
        assert!(!FieldType::Text.optional().is_structured());
    }

    #[test]
    fn display_is_plain_text() {
        assert_eq!(Value::from("a,b").to_string(), "a,b");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(json!(["x"])).to_string(), r#"["x"]"#);
        assert_eq!(FieldType::Float.optional().to_string(), "float?");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(2.5)), Value::Float(2.5));
    }
}
