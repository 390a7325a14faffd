//! Field-condition queries over a table.
//!
//! Exact and loose lookups are the same primitive: a [`Query`] is a list of
//! conditions, each naming a field, a value and a [`Comparator`]. Fields
//! without a condition are wildcards.

use folio_codec::{encode, is_null_token, unescape, DELIMITER, NULL_TOKEN};
use folio_types::{FieldType, Schema, Value};

use crate::error::{StoreError, StoreResult};
use crate::matcher::{loosely_contains, Comparator};

/// One field condition.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: Value,
    pub comparator: Comparator,
}

/// A conjunction of field conditions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    conditions: Vec<Condition>,
}

impl Query {
    /// The empty query, matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query applying one comparator to every `(field, value)` pair.
    pub fn matching(comparator: Comparator, fields: &[(&str, Value)]) -> Self {
        Self {
            conditions: fields
                .iter()
                .map(|(field, value)| Condition {
                    field: field.to_string(),
                    value: value.clone(),
                    comparator,
                })
                .collect(),
        }
    }

    /// Require `field` to equal `value` exactly.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, value, Comparator::Exact)
    }

    /// Require `value` to be loosely contained in `field`.
    pub fn like(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, value, Comparator::Loose)
    }

    pub fn with(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
        comparator: Comparator,
    ) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            value: value.into(),
            comparator,
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Resolve field names against `schema` and pre-encode the values.
    pub fn compile(&self, schema: &Schema) -> StoreResult<Filter> {
        let predicates = self
            .conditions
            .iter()
            .map(|c| {
                let index = schema
                    .field_index(&c.field)
                    .ok_or_else(|| StoreError::UnknownField {
                        schema: schema.name().to_string(),
                        field: c.field.clone(),
                    })?;
                let needle = match c.comparator {
                    Comparator::Exact => encode(&c.value),
                    Comparator::Loose => c.value.to_string(),
                };
                Ok(Predicate {
                    index,
                    ty: schema.fields()[index].ty.clone(),
                    comparator: c.comparator,
                    needle,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Filter { predicates })
    }
}

#[derive(Clone, Debug)]
struct Predicate {
    index: usize,
    ty: FieldType,
    comparator: Comparator,
    needle: String,
}

impl Predicate {
    fn accepts(&self, token: &str) -> bool {
        match self.comparator {
            Comparator::Exact => token == self.needle,
            // Absent values compare as empty text.
            Comparator::Loose if token == NULL_TOKEN || is_null_token(token, &self.ty) => {
                loosely_contains("", &self.needle)
            }
            Comparator::Loose => loosely_contains(&unescape(token), &self.needle),
        }
    }
}

/// A query compiled against one schema, evaluated on raw row text.
///
/// Rows are only split into tokens here; nothing is decoded unless the row
/// matches.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Whether the encoded row `line` satisfies every condition.
    pub fn matches(&self, line: &str) -> bool {
        if self.predicates.is_empty() {
            return true;
        }
        let tokens: Vec<&str> = line.split(DELIMITER).collect();
        self.predicates.iter().all(|p| {
            tokens
                .get(p.index)
                .map(|token| p.accepts(token))
                .unwrap_or(false)
        })
    }
}
