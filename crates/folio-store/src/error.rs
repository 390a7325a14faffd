use std::path::PathBuf;

use folio_types::TypeError;
use thiserror::Error;

/// Errors from record store operations.
///
/// Logical outcomes (record not found, key already taken) are not errors;
/// they come back as `Option`/`bool` results. These variants cover storage
/// failures and caller mistakes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the underlying storage medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The rewritten table could not be renamed over the original.
    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A query named a field the schema does not declare.
    #[error("unknown field {field} for {schema}")]
    UnknownField { schema: String, field: String },

    /// Two different schemas were registered under one entity name, or a
    /// typed collection was bound to a store with a different schema.
    #[error("schema mismatch for {name}: {reason}")]
    SchemaMismatch { name: String, reason: String },

    /// A record does not fit its schema.
    #[error("invalid record for {schema}: {source}")]
    InvalidRecord {
        schema: String,
        #[source]
        source: TypeError,
    },

    /// A lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
