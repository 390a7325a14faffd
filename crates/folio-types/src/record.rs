use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::schema::Schema;
use crate::value::Value;

/// One row of an entity type: values in schema field order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The value of the schema's primary-key column.
    pub fn primary_key<'a>(&'a self, schema: &Schema) -> Option<&'a Value> {
        self.values.get(schema.primary_key_index())
    }

    /// The value of a named field.
    pub fn field<'a>(&'a self, schema: &Schema, name: &str) -> Option<&'a Value> {
        schema.field_index(name).and_then(|i| self.values.get(i))
    }

    // ---------------------------------------------------------------
    // Typed accessors used by entity conversions
    // ---------------------------------------------------------------

    pub fn text(&self, index: usize) -> Result<String, TypeError> {
        match self.value(index)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch(index, "text", other)),
        }
    }

    pub fn opt_text(&self, index: usize) -> Result<Option<String>, TypeError> {
        match self.value(index)? {
            Value::Null => Ok(None),
            _ => self.text(index).map(Some),
        }
    }

    pub fn integer(&self, index: usize) -> Result<i64, TypeError> {
        match self.value(index)? {
            Value::Integer(i) => Ok(*i),
            other => Err(mismatch(index, "integer", other)),
        }
    }

    pub fn opt_integer(&self, index: usize) -> Result<Option<i64>, TypeError> {
        match self.value(index)? {
            Value::Null => Ok(None),
            _ => self.integer(index).map(Some),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64, TypeError> {
        let value = self.value(index)?;
        value.as_f64().ok_or_else(|| mismatch(index, "float", value))
    }

    pub fn opt_float(&self, index: usize) -> Result<Option<f64>, TypeError> {
        match self.value(index)? {
            Value::Null => Ok(None),
            _ => self.float(index).map(Some),
        }
    }

    pub fn boolean(&self, index: usize) -> Result<bool, TypeError> {
        match self.value(index)? {
            Value::Boolean(b) => Ok(*b),
            other => Err(mismatch(index, "boolean", other)),
        }
    }

    /// Deserialize a structured field into `T`.
    pub fn json<T: DeserializeOwned>(&self, index: usize) -> Result<T, TypeError> {
        match self.value(index)? {
            Value::Structured(v) => {
                serde_json::from_value(v.clone()).map_err(|e| TypeError::Mismatch {
                    field: format!("#{index}"),
                    expected: std::any::type_name::<T>().to_string(),
                    found: e.to_string(),
                })
            }
            other => Err(mismatch(index, "structured", other)),
        }
    }

    pub fn opt_json<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, TypeError> {
        match self.value(index)? {
            Value::Null => Ok(None),
            _ => self.json(index).map(Some),
        }
    }

    fn value(&self, index: usize) -> Result<&Value, TypeError> {
        self.values.get(index).ok_or(TypeError::MissingField(index))
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

fn mismatch(index: usize, expected: &str, found: &Value) -> TypeError {
    TypeError::Mismatch {
        field: format!("#{index}"),
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
}
