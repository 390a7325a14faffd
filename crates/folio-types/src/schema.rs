use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::record::Record;
use crate::value::FieldType;

/// One declared field: a name and its type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The layout of one entity type.
///
/// A schema is an ordered list of [`FieldDef`]s and an explicit primary-key
/// designation. The row serializer walks `fields` in order; nothing is
/// inferred from declaration order except column position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDef>,
    primary_key: usize,
}

impl Schema {
    /// Build a schema, validating names and the primary-key designation.
    ///
    /// The entity name doubles as the table file stem, so it is restricted to
    /// ASCII alphanumerics, `_` and `-`. Field names must be unique and must
    /// not contain the row delimiter or line breaks. The primary key must
    /// name a declared, non-optional field.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDef>,
        primary_key: &str,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        let invalid = |reason: String| TypeError::InvalidSchema {
            schema: name.clone(),
            reason,
        };

        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("entity name must be non-empty [A-Za-z0-9_-]".into()));
        }
        if fields.is_empty() {
            return Err(invalid("no fields declared".into()));
        }
        for (i, field) in fields.iter().enumerate() {
            if field.name.is_empty() || field.name.contains(|c: char| matches!(c, ',' | '\n' | '\r')) {
                return Err(invalid(format!("bad field name {:?}", field.name)));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(invalid(format!("duplicate field {}", field.name)));
            }
        }

        let primary_key = fields
            .iter()
            .position(|f| f.name == primary_key)
            .ok_or_else(|| invalid(format!("primary key {primary_key} is not a field")))?;
        if fields[primary_key].ty.is_optional() {
            return Err(invalid(format!(
                "primary key {} cannot be optional",
                fields[primary_key].name
            )));
        }

        Ok(Self {
            name,
            fields,
            primary_key,
        })
    }

    /// Start building a schema for the named entity type.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            primary_key: None,
        }
    }

    /// The entity type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column position of the primary key.
    pub fn primary_key_index(&self) -> usize {
        self.primary_key
    }

    pub fn primary_key_field(&self) -> &FieldDef {
        &self.fields[self.primary_key]
    }

    /// Column position of the named field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Check arity and per-field types of a record.
    pub fn validate(&self, record: &Record) -> Result<(), TypeError> {
        if record.len() != self.fields.len() {
            return Err(TypeError::Arity {
                schema: self.name.clone(),
                expected: self.fields.len(),
                actual: record.len(),
            });
        }
        for (field, value) in self.fields.iter().zip(record.values()) {
            if !field.ty.accepts(value) {
                return Err(TypeError::Mismatch {
                    field: field.name.clone(),
                    expected: field.ty.to_string(),
                    found: value.kind().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Bring every value of a validated record into its canonical form
    /// (see [`FieldType::normalize`]).
    pub fn normalize(&self, record: &Record) -> Record {
        Record::new(
            self.fields
                .iter()
                .zip(record.values())
                .map(|(field, value)| field.ty.normalize(value.clone()))
                .collect(),
        )
    }
}

/// Incremental [`Schema`] construction.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDef>,
    primary_key: Option<String>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    /// Designate the primary key field.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Schema, TypeError> {
        let primary_key = self.primary_key.ok_or_else(|| TypeError::InvalidSchema {
            schema: self.name.clone(),
            reason: "no primary key designated".into(),
        })?;
        Schema::new(self.name, self.fields, &primary_key)
    }
}
