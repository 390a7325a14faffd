//! The file-backed table: one delimited text file per entity type.
//!
//! On-disk layout of `<data_dir>/<TypeName>.csv`:
//!
//! ```text
//! id,title,authors            <- header: field names in schema order
//! b1,Dracula,["Bram Stoker"]  <- one encoded record per line
//! ```
//!
//! Every mutation reads the current file, writes a complete replacement to a
//! temporary file in the same directory and renames it over the original.
//! Mutations on one table are serialized by the table's write lock; readers
//! take no lock and keep reading the file they opened if it is replaced
//! underneath them.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use folio_codec::{decode_row, encode, encode_row, header_line, key_token, line_text};
use folio_types::{Record, Schema, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::query::{Filter, Query};
use crate::traits::RecordStore;

/// Extension of table files.
pub const TABLE_EXTENSION: &str = "csv";

/// Single-key mutations share one rewrite loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mutation {
    Put,
    Post,
    Patch,
    Delete,
}

/// A file-backed table holding the records of one entity type.
pub struct Table {
    schema: Arc<Schema>,
    dir: PathBuf,
    path: PathBuf,
    sync_writes: bool,
    /// Serializes mutations. Readers never take it.
    write_lock: Mutex<()>,
}

impl Table {
    /// Bind a schema to its table file under `dir`.
    ///
    /// No I/O happens here; the file is created on first access.
    pub fn open(dir: impl Into<PathBuf>, schema: Schema) -> Self {
        let dir = dir.into();
        let path = dir.join(format!("{}.{TABLE_EXTENSION}", schema.name()));
        Self {
            schema: Arc::new(schema),
            dir,
            path,
            sync_writes: true,
            write_lock: Mutex::new(()),
        }
    }

    /// Whether rewritten files are fsynced before replacing the original.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Path of the table file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("{} write lock: {e}", self.name())))
    }

    fn temp_file(&self) -> StoreResult<NamedTempFile> {
        Ok(tempfile::Builder::new()
            .prefix(&format!(".tmp_{}_", self.name()))
            .tempfile_in(&self.dir)?)
    }

    /// Create the header-only table file if it does not exist yet.
    fn ensure_exists(&self) -> StoreResult<()> {
        if self.path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;

        let mut tmp = self.temp_file()?;
        writeln!(tmp, "{}", header_line(&self.schema))?;
        if self.sync_writes {
            tmp.as_file().sync_all()?;
        }
        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {
                info!(table = self.name(), path = %self.path.display(), "created table");
                Ok(())
            }
            // Another handle created it first.
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(StoreError::Persist {
                path: self.path.clone(),
                source: e.error,
            }),
        }
    }

    /// Open the table for reading, creating it if needed.
    fn open_reader(&self) -> StoreResult<BufReader<File>> {
        self.ensure_exists()?;
        match File::open(&self.path) {
            Ok(file) => Ok(BufReader::new(file)),
            // Dropped between the existence check and the open.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.ensure_exists()?;
                Ok(BufReader::new(File::open(&self.path)?))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self, record: &Record) -> StoreResult<()> {
        self.schema
            .validate(record)
            .map_err(|source| StoreError::InvalidRecord {
                schema: self.name().to_string(),
                source,
            })
    }

    fn key_of(&self, record: &Record) -> String {
        record
            .primary_key(&self.schema)
            .map(encode)
            .unwrap_or_default()
    }

    /// Shared rewrite loop for put/post/patch/delete.
    ///
    /// Returns whether a row with the key was found. The temporary file is
    /// only renamed into place when the table actually changes.
    fn mutate(&self, mutation: Mutation, key: &str, row: Option<&str>) -> StoreResult<bool> {
        let pk = self.schema.primary_key_index();
        let mut rewrite = Rewrite::begin(self)?;
        let mut found = false;

        while let Some(line) = rewrite.next_line()? {
            if key_token(&line, pk) != Some(key) {
                rewrite.write_line(&line)?;
                continue;
            }
            if found {
                warn!(table = self.name(), key, "dropping duplicate primary key row");
                continue;
            }
            found = true;
            match (mutation, row) {
                (Mutation::Post, _) => return Ok(true),
                (Mutation::Put | Mutation::Patch, Some(row)) => rewrite.write_line(row)?,
                _ => {}
            }
        }

        let changed = match (mutation, row) {
            (Mutation::Put | Mutation::Post, Some(row)) if !found => {
                rewrite.write_line(row)?;
                true
            }
            (Mutation::Put, _) => true,
            (Mutation::Patch | Mutation::Delete, _) => found,
            (Mutation::Post, _) => false,
        };
        if changed {
            rewrite.commit()?;
        }
        debug!(table = self.name(), ?mutation, key, found, changed, "mutation");
        Ok(found)
    }
}

impl RecordStore for Table {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn put(&self, record: &Record) -> StoreResult<()> {
        self.validate(record)?;
        let row = encode_row(record);
        self.mutate(Mutation::Put, &self.key_of(record), Some(&row))?;
        Ok(())
    }

    fn post(&self, record: &Record) -> StoreResult<bool> {
        self.validate(record)?;
        let row = encode_row(record);
        let found = self.mutate(Mutation::Post, &self.key_of(record), Some(&row))?;
        Ok(!found)
    }

    fn patch(&self, record: &Record) -> StoreResult<bool> {
        self.validate(record)?;
        let row = encode_row(record);
        self.mutate(Mutation::Patch, &self.key_of(record), Some(&row))
    }

    fn delete(&self, key: &Value) -> StoreResult<()> {
        self.mutate(Mutation::Delete, &encode(key), None)?;
        Ok(())
    }

    fn post_batch(&self, records: &[Record]) -> StoreResult<usize> {
        let mut pending = Vec::with_capacity(records.len());
        let mut batch_keys = HashSet::with_capacity(records.len());
        for record in records {
            self.validate(record)?;
            let key = self.key_of(record);
            if batch_keys.insert(key.clone()) {
                pending.push((key, encode_row(record)));
            }
        }
        if pending.is_empty() {
            return Ok(0);
        }

        let pk = self.schema.primary_key_index();
        let mut rewrite = Rewrite::begin(self)?;
        let mut stored_keys = HashSet::new();
        while let Some(line) = rewrite.next_line()? {
            if let Some(token) = key_token(&line, pk) {
                if !stored_keys.insert(token.to_string()) {
                    warn!(table = self.name(), key = token, "dropping duplicate primary key row");
                    continue;
                }
            }
            rewrite.write_line(&line)?;
        }

        let mut inserted = 0;
        for (key, row) in &pending {
            if !stored_keys.contains(key) {
                rewrite.write_line(row)?;
                inserted += 1;
            }
        }
        if inserted > 0 {
            rewrite.commit()?;
        }
        debug!(table = self.name(), offered = records.len(), inserted, "batch insert");
        Ok(inserted)
    }

    fn get_by_primary_key(&self, key: &Value) -> StoreResult<Option<Record>> {
        let query = Query::new().eq(self.schema.primary_key_field().name.clone(), key.clone());
        self.select(&query)?.next().transpose()
    }

    fn select(&self, query: &Query) -> StoreResult<Rows> {
        let filter = query.compile(&self.schema)?;
        let mut reader = self.open_reader()?;
        let mut buf = Vec::new();
        read_raw_line(&mut reader, &mut buf)?;
        Ok(Rows {
            schema: Arc::clone(&self.schema),
            reader: Some(reader),
            filter,
            buf,
            line_no: 1,
        })
    }

    fn drop_all(&self) -> StoreResult<()> {
        let _guard = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(table = self.name(), path = %self.path.display(), "dropped table");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name())
            .field("path", &self.path)
            .field("sync_writes", &self.sync_writes)
            .finish()
    }
}

/// One in-progress rewrite of a table file.
///
/// Holds the write lock for its lifetime. Dropping it without calling
/// [`commit`](Rewrite::commit) deletes the temporary file and leaves the
/// table untouched.
struct Rewrite<'a> {
    table: &'a Table,
    _guard: MutexGuard<'a, ()>,
    source: BufReader<File>,
    out: BufWriter<NamedTempFile>,
    buf: Vec<u8>,
    line_no: usize,
}

impl<'a> Rewrite<'a> {
    fn begin(table: &'a Table) -> StoreResult<Self> {
        let guard = table.lock()?;
        let mut source = table.open_reader()?;

        let mut buf = Vec::new();
        read_raw_line(&mut source, &mut buf)?;
        let (header, _) = line_text(&buf);
        let expected = header_line(&table.schema);
        if header != expected.as_str() {
            warn!(
                table = table.name(),
                found = %header,
                %expected,
                "table header does not match schema; rewriting with schema header"
            );
        }

        let mut out = BufWriter::new(table.temp_file()?);
        writeln!(out, "{expected}")?;
        Ok(Self {
            table,
            _guard: guard,
            source,
            out,
            buf,
            line_no: 1,
        })
    }

    /// Next non-empty data line of the original file, without its newline.
    ///
    /// Lines that are not valid UTF-8 are carried over as Latin-1 text.
    fn next_line(&mut self) -> StoreResult<Option<String>> {
        loop {
            if !read_raw_line(&mut self.source, &mut self.buf)? {
                return Ok(None);
            }
            self.line_no += 1;
            if self.buf.is_empty() {
                continue;
            }
            let (line, anomaly) = line_text(&self.buf);
            if let Some(anomaly) = anomaly {
                warn!(table = self.table.name(), line = self.line_no, ?anomaly, "rewriting row");
            }
            return Ok(Some(line.into_owned()));
        }
    }

    fn write_line(&mut self, line: &str) -> StoreResult<()> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the replacement and rename it over the original.
    fn commit(self) -> StoreResult<()> {
        let tmp = self.out.into_inner().map_err(|e| e.into_error())?;
        if self.table.sync_writes {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&self.table.path)
            .map_err(|e| StoreError::Persist {
                path: self.table.path.clone(),
                source: e.error,
            })?;
        Ok(())
    }
}

/// Read one line into `buf` as raw bytes, without its terminator.
///
/// Returns `false` at end of file.
fn read_raw_line(reader: &mut impl BufRead, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(true)
}

/// Lazy, single-pass stream of the records matching a query.
///
/// Holds its own handle on the table file, so a concurrent rewrite does not
/// disturb it. Rows that decode imperfectly are yielded best-effort and the
/// anomaly is logged; an I/O error is yielded once and ends the stream.
pub struct Rows {
    schema: Arc<Schema>,
    reader: Option<BufReader<File>>,
    filter: Filter,
    buf: Vec<u8>,
    line_no: usize,
}

impl Iterator for Rows {
    type Item = StoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let reader = self.reader.as_mut()?;
            match read_raw_line(reader, &mut self.buf) {
                Ok(false) => {
                    self.reader = None;
                    return None;
                }
                Ok(true) => self.line_no += 1,
                Err(e) => {
                    self.reader = None;
                    return Some(Err(e.into()));
                }
            }

            let (line, encoding) = line_text(&self.buf);
            if line.is_empty() || !self.filter.matches(&line) {
                continue;
            }
            let decoded = decode_row(&self.schema, &line);
            for anomaly in encoding.iter().chain(&decoded.anomalies) {
                warn!(table = self.schema.name(), line = self.line_no, ?anomaly, "best-effort row decode");
            }
            return Some(Ok(decoded.record));
        }
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("table", &self.schema.name())
            .field("line_no", &self.line_no)
            .field("exhausted", &self.reader.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::FieldType;

    fn item_schema() -> Schema {
        Schema::builder("Item")
            .field("id", FieldType::Text)
            .field("label", FieldType::Text)
            .primary_key("id")
            .build()
            .unwrap()
    }

    fn item(id: &str, label: &str) -> Record {
        Record::new(vec![id.into(), label.into()])
    }

    fn file_lines(table: &Table) -> Vec<String> {
        fs::read_to_string(table.path())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn table_file_is_created_lazily_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path().join("nested"), item_schema());
        assert!(!table.path().exists());

        assert_eq!(table.get_all().unwrap().count(), 0);
        assert_eq!(file_lines(&table), vec!["id,label"]);
    }

    #[test]
    fn rows_are_written_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path(), item_schema());
        table.post(&item("1", "orange")).unwrap();
        table.post(&item("2", "peach,nectarine")).unwrap();

        assert_eq!(
            file_lines(&table),
            vec!["id,label", "1,orange", "2,peach%2Cnectarine"]
        );
    }

    #[test]
    fn key_match_is_whole_token_not_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path(), item_schema());
        table.put(&item("10", "ten")).unwrap();
        assert!(table.post(&item("1", "one")).unwrap());
        assert_eq!(table.get_by_primary_key(&"1".into()).unwrap(), Some(item("1", "one")));
        assert_eq!(table.get_by_primary_key(&"10".into()).unwrap(), Some(item("10", "ten")));

        table.delete(&"1".into()).unwrap();
        assert!(table.exists(&"10".into()).unwrap());
    }

    #[test]
    fn noop_mutations_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path(), item_schema());
        table.put(&item("1", "a")).unwrap();
        assert!(!table.post(&item("1", "b")).unwrap());
        assert!(!table.patch(&item("2", "b")).unwrap());
        table.delete(&"3".into()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Item.csv"]);
    }

    #[test]
    fn invalid_records_are_rejected_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path(), item_schema());
        let err = table.put(&Record::new(vec!["1".into()])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { .. }));
        assert!(!table.path().exists());
    }

    #[test]
    fn legacy_duplicates_collapse_on_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path(), item_schema());
        fs::write(table.path(), "id,label\n1,first\n2,other\n1,second\n").unwrap();

        table.put(&item("1", "fresh")).unwrap();
        assert_eq!(file_lines(&table), vec!["id,label", "1,fresh", "2,other"]);
    }

    #[test]
    fn missing_trailing_newline_is_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path(), item_schema());
        fs::write(table.path(), "id,label\n1,a").unwrap();

        table.put(&item("2", "b")).unwrap();
        assert_eq!(file_lines(&table), vec!["id,label", "1,a", "2,b"]);
    }

    #[test]
    fn rows_survive_a_concurrent_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path(), item_schema());
        for i in 0..5 {
            table.put(&item(&i.to_string(), "x")).unwrap();
        }

        let mut rows = table.get_all().unwrap();
        let first = rows.next().unwrap().unwrap();
        table.drop_all().unwrap();
        table.put(&item("new", "y")).unwrap();

        // The open stream still sees the old file.
        assert_eq!(first, item("0", "x"));
        assert_eq!(rows.count(), 4);
        assert_eq!(table.count().unwrap(), 1);
    }

    #[test]
    fn drop_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::open(dir.path(), item_schema());
        table.drop_all().unwrap();
        table.put(&item("1", "a")).unwrap();
        table.drop_all().unwrap();
        assert!(!table.path().exists());
        table.drop_all().unwrap();
        assert_eq!(table.count().unwrap(), 0);
    }
}
