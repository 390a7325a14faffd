use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use folio_types::Schema;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::table::{Table, TABLE_EXTENSION};
use crate::traits::RecordStore;

/// Hands out one shared [`Table`] per entity type under a data directory.
///
/// Every handle for a type shares the table's write lock, so mutations of
/// that type are serialized no matter which handle issues them. Separate
/// registries share nothing.
#[derive(Debug)]
pub struct Registry {
    config: StoreConfig,
    tables: Mutex<HashMap<String, Arc<Table>>>,
}

impl Registry {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            tables: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The table for `schema`, opened on first request.
    ///
    /// Fails with [`StoreError::SchemaMismatch`] if a different schema was
    /// already registered under the same entity name.
    pub fn table(&self, schema: &Schema) -> StoreResult<Arc<Table>> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("registry: {e}")))?;

        if let Some(table) = tables.get(schema.name()) {
            if table.schema() != schema {
                return Err(StoreError::SchemaMismatch {
                    name: schema.name().to_string(),
                    reason: "entity name already registered with a different schema".into(),
                });
            }
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(
            Table::open(&self.config.data_dir, schema.clone())
                .with_sync_writes(self.config.sync_writes),
        );
        debug!(table = schema.name(), "registered table");
        tables.insert(schema.name().to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Entity names registered so far, sorted.
    pub fn table_names(&self) -> StoreResult<Vec<String>> {
        let tables = self
            .tables
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("registry: {e}")))?;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Entity names with a table file in the data directory, sorted.
    ///
    /// A missing data directory simply has no tables.
    pub fn stored_tables(&self) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(&self.config.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
