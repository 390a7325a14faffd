use std::path::PathBuf;

use folio_store::StoreError;
use thiserror::Error;

/// Errors from domain model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A field value violates a domain rule.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A bulk import source could not be read.
    #[error("cannot import {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;
