//! Foundation types for Folio.
//!
//! Every entity stored by Folio is described by a [`Schema`]: an explicit,
//! ordered list of typed fields plus the name of the field acting as the
//! primary key. A [`Record`] is one row of [`Value`]s laid out in schema
//! order. These types carry no I/O; the codec and the record store consume
//! them directly.
//!
//! # Modules
//!
//! - [`value`] -- [`FieldType`] and the dynamic [`Value`] it describes
//! - [`schema`] -- [`FieldDef`], [`Schema`] and its builder
//! - [`record`] -- [`Record`] and typed field accessors
//! - [`error`] -- [`TypeError`]

pub mod error;
pub mod record;
pub mod schema;
pub mod value;

pub use error::TypeError;
pub use record::Record;
pub use schema::{FieldDef, Schema, SchemaBuilder};
pub use value::{FieldType, Value};
