use folio_types::{FieldType, Value};

use crate::error::CodecError;
use crate::escape::{escape, unescape};

/// Token written for an absent optional value.
///
/// Every `%` in an escaped value is followed by a known escape code, so no
/// encoded value can equal this sentinel.
pub const NULL_TOKEN: &str = "%00";

/// Absent marker written by older table files. Only honored for optional
/// non-text fields, where it cannot be a legitimate value.
const LEGACY_NULL: &str = "None";

/// Encode one value as a delimiter-safe token.
pub fn encode(value: &Value) -> String {
    match value {
        Value::Null => NULL_TOKEN.to_string(),
        Value::Text(s) => escape(s).into_owned(),
        Value::Integer(i) => i.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Structured(v) => escape(&v.to_string()).into_owned(),
    }
}

/// Whether `token` stands for an absent value of a field typed `ty`.
pub fn is_null_token(token: &str, ty: &FieldType) -> bool {
    ty.is_optional() && (token == NULL_TOKEN || (token == LEGACY_NULL && *ty.inner() != FieldType::Text))
}

/// Decode a token as `ty`, falling back to the raw unescaped text when the
/// token does not parse.
pub fn decode(token: &str, ty: &FieldType) -> Value {
    try_decode(token, ty).unwrap_or_else(|e| Value::Text(e.raw))
}

/// Decode a token as `ty`, reporting tokens that do not parse.
pub fn try_decode(token: &str, ty: &FieldType) -> Result<Value, CodecError> {
    if is_null_token(token, ty) {
        return Ok(Value::Null);
    }

    let inner = ty.inner();

    let text = unescape(token);
    let parsed = match inner {
        FieldType::Text if token != NULL_TOKEN => Some(Value::Text(text.to_string())),
        FieldType::Text => None,
        FieldType::Integer => parse_integer(&text).map(Value::Integer),
        FieldType::Float => text.parse::<f64>().ok().map(Value::Float),
        FieldType::Boolean => match text.as_ref() {
            "true" | "True" => Some(Value::Boolean(true)),
            "false" | "False" => Some(Value::Boolean(false)),
            _ => None,
        },
        FieldType::List => serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .filter(serde_json::Value::is_array)
            .map(Value::Structured),
        FieldType::Map => serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .filter(serde_json::Value::is_object)
            .map(Value::Structured),
        FieldType::Optional(_) => unreachable!("inner() strips optional"),
    };

    parsed.ok_or_else(|| CodecError {
        expected: ty.clone(),
        raw: text.into_owned(),
    })
}

/// Integers, also accepting integral floats such as `5.0`.
fn parse_integer(text: &str) -> Option<i64> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(i);
    }
    let x = text.parse::<f64>().ok()?;
    (x.fract() == 0.0 && x.abs() < i64::MAX as f64).then_some(x as i64)
}
