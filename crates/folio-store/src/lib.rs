//! File-backed record store for Folio.
//!
//! Each entity type lives in one delimited text file,
//! `<data_dir>/<TypeName>.csv`: a header line naming the fields, then one
//! encoded record per line. The file is the source of truth; there is no
//! index and no in-memory copy.
//!
//! # Storage
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`Table`] -- the file-backed table
//! - `folio_cache::CachedStore` -- a read-through LRU in front of any store
//!
//! [`Registry`] hands out one shared [`Table`] per entity type, and
//! [`Collection`] layers typed [`Entity`] access over any store.
//!
//! # Design Rules
//!
//! 1. At most one record per primary key after every mutation.
//! 2. Every mutation rewrites the whole file to a temporary sibling and
//!    renames it into place; readers see the table before or after, never
//!    in between.
//! 3. Mutations of one entity type are serialized; reads never block.
//! 4. Not-found and already-exists are ordinary results, not errors.
//! 5. All I/O errors are propagated, never silently ignored.
//! 6. Damaged rows are decoded best-effort and logged, never fatal to a scan.

pub mod config;
pub mod entity;
pub mod error;
pub mod matcher;
pub mod query;
pub mod registry;
pub mod table;
pub mod traits;

pub use config::{CacheConfig, StoreConfig, DEFAULT_CACHE_CAPACITY};
pub use entity::{Collection, Entities, Entity};
pub use error::{StoreError, StoreResult};
pub use matcher::{loosely_contains, Comparator};
pub use query::{Condition, Filter, Query};
pub use registry::Registry;
pub use table::{Rows, Table, TABLE_EXTENSION};
pub use traits::RecordStore;

// Re-exported so downstream crates can name records without a direct
// dependency on the types crate.
pub use folio_types::{FieldDef, FieldType, Record, Schema, TypeError, Value};
