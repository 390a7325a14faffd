//! Typed access on top of a [`RecordStore`].
//!
//! An [`Entity`] maps a Rust struct to and from a [`Record`] laid out by its
//! schema. A [`Collection`] wraps any store holding that schema and speaks
//! in entities instead of records.

use std::marker::PhantomData;
use std::sync::Arc;

use folio_types::{Record, Schema, TypeError, Value};
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::table::{Rows, Table};
use crate::traits::RecordStore;

/// A struct persisted as one row of a table.
pub trait Entity: Sized {
    /// The schema every instance is laid out by.
    fn schema() -> &'static Schema;

    /// Lay the fields out in schema order.
    fn to_record(&self) -> Record;

    /// Rebuild an instance from a decoded row.
    fn from_record(record: &Record) -> Result<Self, TypeError>;

    /// The primary-key value of this instance.
    fn primary_key(&self) -> Value {
        let index = Self::schema().primary_key_index();
        let mut values = self.to_record().into_values();
        if index < values.len() {
            values.swap_remove(index)
        } else {
            Value::Null
        }
    }
}

/// Typed view of a store holding the records of entity `E`.
pub struct Collection<E, S: RecordStore = Table> {
    store: Arc<S>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S: RecordStore> Clone for Collection<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity, S: RecordStore> Collection<E, S> {
    /// Bind a store to an entity type. The store's schema must be `E`'s.
    pub fn new(store: Arc<S>) -> StoreResult<Self> {
        if store.schema() != E::schema() {
            return Err(StoreError::SchemaMismatch {
                name: E::schema().name().to_string(),
                reason: format!("store holds {}", store.schema().name()),
            });
        }
        Ok(Self {
            store,
            _entity: PhantomData,
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn put(&self, entity: &E) -> StoreResult<()> {
        self.store.put(&entity.to_record())
    }

    /// Insert only if the key is unused. `false` means nothing changed.
    pub fn post(&self, entity: &E) -> StoreResult<bool> {
        self.store.post(&entity.to_record())
    }

    /// Overwrite only if the key exists. `false` means nothing changed.
    pub fn patch(&self, entity: &E) -> StoreResult<bool> {
        self.store.patch(&entity.to_record())
    }

    pub fn delete(&self, entity: &E) -> StoreResult<()> {
        self.store.delete(&entity.primary_key())
    }

    pub fn delete_key(&self, key: impl Into<Value>) -> StoreResult<()> {
        self.store.delete(&key.into())
    }

    pub fn post_batch(&self, entities: &[E]) -> StoreResult<usize> {
        let records: Vec<Record> = entities.iter().map(Entity::to_record).collect();
        self.store.post_batch(&records)
    }

    /// Look up one entity by key.
    ///
    /// A stored row that no longer converts into `E` is an error here, unlike
    /// in scans where it is skipped.
    pub fn get(&self, key: impl Into<Value>) -> StoreResult<Option<E>> {
        self.store
            .get_by_primary_key(&key.into())?
            .map(|record| convert(&record))
            .transpose()
    }

    pub fn exists(&self, key: impl Into<Value>) -> StoreResult<bool> {
        self.store.exists(&key.into())
    }

    pub fn select(&self, query: &Query) -> StoreResult<Entities<E>> {
        Ok(Entities::new(self.store.select(query)?))
    }

    pub fn get_all(&self) -> StoreResult<Entities<E>> {
        Ok(Entities::new(self.store.get_all()?))
    }

    pub fn get_where(&self, fields: &[(&str, Value)]) -> StoreResult<Entities<E>> {
        Ok(Entities::new(self.store.get_where(fields)?))
    }

    pub fn get_first_where(&self, fields: &[(&str, Value)]) -> StoreResult<Option<E>> {
        self.get_where(fields)?.next().transpose()
    }

    pub fn get_where_like(&self, fields: &[(&str, Value)]) -> StoreResult<Entities<E>> {
        Ok(Entities::new(self.store.get_where_like(fields)?))
    }

    pub fn count(&self) -> StoreResult<usize> {
        self.store.count()
    }

    pub fn generate_unique_primary_key(&self) -> StoreResult<String> {
        self.store.generate_unique_primary_key()
    }

    pub fn drop_all(&self) -> StoreResult<()> {
        self.store.drop_all()
    }
}

impl<E, S: RecordStore> std::fmt::Debug for Collection<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("schema", &self.store.schema().name())
            .finish()
    }
}

fn convert<E: Entity>(record: &Record) -> StoreResult<E> {
    E::from_record(record).map_err(|source| StoreError::InvalidRecord {
        schema: E::schema().name().to_string(),
        source,
    })
}

/// Stream of entities over [`Rows`]. Rows that do not convert are logged and
/// skipped.
pub struct Entities<E> {
    rows: Rows,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Entities<E> {
    fn new(rows: Rows) -> Self {
        Self {
            rows,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Iterator for Entities<E> {
    type Item = StoreResult<E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.rows.next()? {
                Ok(record) => match E::from_record(&record) {
                    Ok(entity) => return Some(Ok(entity)),
                    Err(error) => {
                        warn!(table = E::schema().name(), %error, "skipping unconvertible row");
                    }
                },
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
