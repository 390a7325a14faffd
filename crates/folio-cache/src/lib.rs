//! Read-through LRU cache for Folio record stores.
//!
//! [`CachedStore`] wraps any [`RecordStore`] and remembers the outcome of
//! primary-key lookups, including "no such record". It implements
//! [`RecordStore`] itself, so callers swap it in without other changes.
//!
//! ## Coherence
//!
//! Every write issued through the wrapper updates or evicts the affected
//! entry after the underlying store has committed it:
//!
//! | Operation      | Cache effect                                  |
//! |----------------|-----------------------------------------------|
//! | `put`          | cache the new record                          |
//! | `post`         | cache on insert, evict on conflict            |
//! | `patch`        | cache on success, remember absent on miss     |
//! | `delete`       | evict                                         |
//! | `post_batch`   | evict every key in the batch                  |
//! | `drop_all`     | clear entries and counters                    |
//!
//! A lookup that misses reads the store without holding the cache lock. If a
//! write lands in the meantime, the write epoch moves and the possibly stale
//! result is returned but not cached.
//!
//! Records are cached in their normalized form, so a hit returns exactly what
//! a read of the store would. Writes that bypass the wrapper are not observed.

mod stats;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use folio_codec::encode;
use folio_store::{
    CacheConfig, Query, Record, RecordStore, Rows, Schema, StoreError, StoreResult, Value,
};
use lru::LruCache;
use tracing::{debug, info};

pub use stats::CacheStats;

struct CacheState {
    /// Encoded primary key to the last known lookup outcome.
    entries: LruCache<String, Option<Record>>,
    hits: u64,
    misses: u64,
    /// Bumped by every write through the wrapper.
    epoch: u64,
}

/// A [`RecordStore`] with a bounded LRU over primary-key lookups.
pub struct CachedStore<S> {
    inner: Arc<S>,
    state: Mutex<CacheState>,
    /// Held across a write and its cache update so concurrent writers cannot
    /// leave the cache behind the file. Lookups never take it.
    write_lock: Mutex<()>,
}

impl<S: RecordStore> CachedStore<S> {
    /// Wrap `inner` with room for `max_entries` lookups.
    pub fn new(inner: Arc<S>, max_entries: NonZeroUsize) -> Self {
        Self {
            inner,
            state: Mutex::new(CacheState {
                entries: LruCache::new(max_entries),
                hits: 0,
                misses: 0,
                epoch: 0,
            }),
            write_lock: Mutex::new(()),
        }
    }

    /// Wrap `inner`, sized by the configured capacity for its entity type.
    pub fn from_config(inner: Arc<S>, config: &CacheConfig) -> Self {
        let capacity = config.capacity_for(inner.schema().name());
        info!(
            table = inner.schema().name(),
            max_entries = capacity.get(),
            "read-through cache enabled"
        );
        Self::new(inner, capacity)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> StoreResult<CacheStats> {
        let state = self.state()?;
        Ok(CacheStats {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            max_entries: state.entries.cap().get(),
        })
    }

    /// Forget every entry and reset the counters. The store is untouched.
    pub fn clear(&self) -> StoreResult<()> {
        let mut state = self.state()?;
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        state.epoch += 1;
        Ok(())
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, CacheState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("cache state: {e}")))
    }

    fn writer(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("cache writer: {e}")))
    }

    fn key_of(&self, record: &Record) -> String {
        record
            .primary_key(self.inner.schema())
            .map(encode)
            .unwrap_or_default()
    }

    /// The record as a later read of the store would return it.
    fn stored_form(&self, record: &Record) -> Record {
        self.inner.schema().normalize(record)
    }

    /// Record the outcome of a write: `Some(entry)` stores it, `None` evicts.
    fn settle(&self, key: String, entry: Option<Option<Record>>) -> StoreResult<()> {
        let mut state = self.state()?;
        state.epoch += 1;
        match entry {
            Some(entry) => {
                state.entries.put(key, entry);
            }
            None => {
                state.entries.pop(&key);
            }
        }
        Ok(())
    }

    /// Run a write and settle the cache, evicting the key if the write fails.
    fn write_through<T>(
        &self,
        key: String,
        write: impl FnOnce() -> StoreResult<T>,
        entry: impl FnOnce(&T) -> Option<Option<Record>>,
    ) -> StoreResult<T> {
        let _writer = self.writer()?;
        match write() {
            Ok(outcome) => {
                self.settle(key, entry(&outcome))?;
                Ok(outcome)
            }
            Err(e) => {
                self.settle(key, None)?;
                Err(e)
            }
        }
    }
}

impl<S: RecordStore> RecordStore for CachedStore<S> {
    fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    fn put(&self, record: &Record) -> StoreResult<()> {
        self.write_through(
            self.key_of(record),
            || self.inner.put(record),
            |_| Some(Some(self.stored_form(record))),
        )
    }

    fn post(&self, record: &Record) -> StoreResult<bool> {
        self.write_through(
            self.key_of(record),
            || self.inner.post(record),
            |inserted| inserted.then(|| Some(self.stored_form(record))),
        )
    }

    fn patch(&self, record: &Record) -> StoreResult<bool> {
        self.write_through(
            self.key_of(record),
            || self.inner.patch(record),
            |patched| Some(patched.then(|| self.stored_form(record))),
        )
    }

    fn delete(&self, key: &Value) -> StoreResult<()> {
        self.write_through(encode(key), || self.inner.delete(key), |_| None)
    }

    fn post_batch(&self, records: &[Record]) -> StoreResult<usize> {
        let _writer = self.writer()?;
        let result = self.inner.post_batch(records);
        let mut state = self.state()?;
        state.epoch += 1;
        for record in records {
            state.entries.pop(&self.key_of(record));
        }
        result
    }

    fn get_by_primary_key(&self, key: &Value) -> StoreResult<Option<Record>> {
        let token = encode(key);
        let epoch = {
            let mut state = self.state()?;
            if let Some(hit) = state.entries.get(&token).cloned() {
                state.hits += 1;
                return Ok(hit);
            }
            state.misses += 1;
            state.epoch
        };

        let found = self.inner.get_by_primary_key(key)?;

        let mut state = self.state()?;
        if state.epoch == epoch {
            state.entries.put(token, found.clone());
        } else {
            debug!(
                table = self.inner.schema().name(),
                key = %token,
                "write raced with lookup; not caching"
            );
        }
        Ok(found)
    }

    fn select(&self, query: &Query) -> StoreResult<Rows> {
        self.inner.select(query)
    }

    fn drop_all(&self) -> StoreResult<()> {
        let _writer = self.writer()?;
        let result = self.inner.drop_all();
        self.clear()?;
        result
    }
}

impl<S: RecordStore> std::fmt::Debug for CachedStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStore")
            .field("table", &self.inner.schema().name())
            .field("stats", &self.stats().ok())
            .finish()
    }
}
