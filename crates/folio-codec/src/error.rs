use folio_types::FieldType;
use thiserror::Error;

/// A token that could not be read as its declared field type.
///
/// `raw` holds the unescaped token text, which best-effort decoding uses as
/// the fallback value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot decode {raw:?} as {expected}")]
pub struct CodecError {
    pub expected: FieldType,
    pub raw: String,
}
