//! The [`RecordStore`] trait: the storage interface for one entity type.

use folio_types::{Record, Schema, Value};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::matcher::Comparator;
use crate::query::Query;
use crate::table::Rows;

/// Storage for the records of one entity type.
///
/// Implementations must be thread-safe and uphold these invariants:
/// - At most one stored record per primary key, after any mutation.
/// - Mutations are serialized; a reader sees the table as it was before or
///   after a mutation, never in between.
/// - Not-found and already-exists are ordinary results (`Option`/`bool`);
///   only storage failures are errors, and they are never swallowed.
pub trait RecordStore: Send + Sync {
    /// The schema records are laid out by.
    fn schema(&self) -> &Schema;

    /// Create the record, or replace the one with the same primary key.
    fn put(&self, record: &Record) -> StoreResult<()>;

    /// Create the record only if its primary key is unused.
    ///
    /// Returns `false` (and changes nothing) if the key is taken.
    fn post(&self, record: &Record) -> StoreResult<bool>;

    /// Replace the stored record with the same primary key.
    ///
    /// Returns `false` (and changes nothing) if there is no such record.
    fn patch(&self, record: &Record) -> StoreResult<bool>;

    /// Remove the record with this primary key. Deleting an absent key is
    /// not an error.
    fn delete(&self, key: &Value) -> StoreResult<()>;

    /// Insert every record whose primary key is not already stored (or
    /// earlier in the batch), in one rewrite. Returns the number inserted.
    fn post_batch(&self, records: &[Record]) -> StoreResult<usize>;

    /// Look up a record by primary key.
    fn get_by_primary_key(&self, key: &Value) -> StoreResult<Option<Record>>;

    /// Stream the records satisfying `query`, in file order.
    ///
    /// Each call re-reads the table from the start.
    fn select(&self, query: &Query) -> StoreResult<Rows>;

    /// Permanently remove the table. The next access recreates it empty.
    fn drop_all(&self) -> StoreResult<()>;

    /// Whether a record with this primary key exists.
    fn exists(&self, key: &Value) -> StoreResult<bool> {
        Ok(self.get_by_primary_key(key)?.is_some())
    }

    /// Every record, in file order.
    fn get_all(&self) -> StoreResult<Rows> {
        self.select(&Query::new())
    }

    /// Records whose listed fields equal the given values.
    fn get_where(&self, fields: &[(&str, Value)]) -> StoreResult<Rows> {
        self.select(&Query::matching(Comparator::Exact, fields))
    }

    /// The first record whose listed fields equal the given values.
    fn get_first_where(&self, fields: &[(&str, Value)]) -> StoreResult<Option<Record>> {
        self.get_where(fields)?.next().transpose()
    }

    /// Records whose listed text fields loosely contain the given values.
    fn get_where_like(&self, fields: &[(&str, Value)]) -> StoreResult<Rows> {
        self.select(&Query::matching(Comparator::Loose, fields))
    }

    /// Number of stored records.
    fn count(&self) -> StoreResult<usize> {
        self.get_all()?.try_fold(0, |n, row| row.map(|_| n + 1))
    }

    /// Mint a random primary key that no stored record uses.
    fn generate_unique_primary_key(&self) -> StoreResult<String> {
        loop {
            let key = Uuid::new_v4().simple().to_string();
            if !self.exists(&Value::Text(key.clone()))? {
                return Ok(key);
            }
        }
    }
}
