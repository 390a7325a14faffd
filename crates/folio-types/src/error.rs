use thiserror::Error;

/// Errors produced while declaring schemas or reading typed fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid schema {schema}: {reason}")]
    InvalidSchema { schema: String, reason: String },

    #[error("record has {actual} fields, schema {schema} declares {expected}")]
    Arity {
        schema: String,
        expected: usize,
        actual: usize,
    },

    #[error("field {field}: expected {expected}, found {found}")]
    Mismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("field index {0} is out of range")]
    MissingField(usize),

    #[error("value out of range for field {field}: {reason}")]
    OutOfRange { field: String, reason: String },
}
