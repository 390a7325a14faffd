//! Field and row encoding for Folio tables.
//!
//! A table row is a list of tokens joined by [`DELIMITER`]. Each token is the
//! encoded form of one field value:
//!
//! - text is escaped so it never contains the delimiter or a line break
//! - numbers and booleans use their canonical textual form
//! - sequences and mappings are serialized to compact JSON, then escaped
//! - an absent optional value is the sentinel [`NULL_TOKEN`]
//!
//! Decoding is driven by the declared [`FieldType`](folio_types::FieldType)
//! and never fails outright: a token that does not parse as its declared type
//! is handed back as raw text, and the row decoder reports the anomaly to the
//! caller instead of rejecting the row.
//!
//! For every value `v` accepted by a field type `t`,
//! `decode(&encode(&v), &t) == t.normalize(v)`. Normalization only widens
//! integers given for float fields, so values already in canonical form
//! round-trip unchanged.

pub mod error;
pub mod escape;
pub mod field;
pub mod row;

pub use error::CodecError;
pub use escape::{escape, unescape, DELIMITER};
pub use field::{decode, encode, is_null_token, try_decode, NULL_TOKEN};
pub use row::{decode_row, encode_row, header_line, key_token, line_text, Anomaly, DecodedRow};
