//! Record storage behind the import engine.
//!
//! The engine only needs two operations from storage: fetch every record of
//! one kind for a user, and upsert a batch keyed by the record's natural
//! uniqueness constraint. [`JsonlStore`] keeps one JSON Lines file per table
//! with file locking; [`MemoryStore`] keeps everything in memory and can be
//! told to fail calls.

use crate::{CheckinRecord, Error, Exercise, Result, WorkoutRecord};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// A record kind the store can hold
pub trait StoredRecord: Clone + Serialize + DeserializeOwned {
    /// Per-user natural key
    type Key: Ord + Clone + fmt::Debug;

    /// Table (and file stem) the records live in
    const TABLE: &'static str;

    fn user_id(&self) -> &str;
    fn natural_key(&self) -> Self::Key;
    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
}

impl StoredRecord for WorkoutRecord {
    type Key = (NaiveDate, Exercise);
    const TABLE: &'static str = "workout_sets";

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn natural_key(&self) -> Self::Key {
        self.key()
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

impl StoredRecord for CheckinRecord {
    type Key = NaiveDate;
    const TABLE: &'static str = "daily_checkins";

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn natural_key(&self) -> Self::Key {
        self.date
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Storage operations required by the import engine
pub trait RecordStore {
    /// Every record of kind `R` owned by `user_id`
    fn fetch_all<R: StoredRecord>(&self, user_id: &str) -> Result<Vec<R>>;

    /// Insert or replace records sharing (user, natural key)
    ///
    /// A replaced record keeps the id of the stored one.
    fn upsert_batch<R: StoredRecord>(&mut self, records: &[R]) -> Result<()>;
}

/// Apply an upsert to an in-memory table
fn apply_upsert<R: StoredRecord>(table: &mut Vec<R>, incoming: &[R]) {
    let mut index: BTreeMap<(String, R::Key), usize> = table
        .iter()
        .enumerate()
        .map(|(i, r)| ((r.user_id().to_string(), r.natural_key()), i))
        .collect();

    for record in incoming {
        let key = (record.user_id().to_string(), record.natural_key());
        match index.get(&key) {
            Some(&i) => {
                let mut replacement = record.clone();
                replacement.set_id(table[i].id());
                table[i] = replacement;
            }
            None => {
                index.insert(key, table.len());
                table.push(record.clone());
            }
        }
    }
}

// ============================================================================
// JSON Lines store
// ============================================================================

/// File-backed store, one `<table>.jsonl` file per record kind
pub struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path<R: StoredRecord>(&self) -> PathBuf {
        self.dir.join(format!("{}.jsonl", R::TABLE))
    }

    fn lock_path<R: StoredRecord>(&self) -> PathBuf {
        self.dir.join(format!("{}.lock", R::TABLE))
    }

    /// Every record in a table regardless of owner
    pub fn read_table<R: StoredRecord>(&self) -> Result<Vec<R>> {
        Ok(read_table_file(&self.table_path::<R>())?.records)
    }

    /// Atomically replace a table's file contents
    ///
    /// Unreadable lines from the previous contents are written back
    /// unchanged after the records.
    fn write_table<R: StoredRecord>(&self, table: &TableFile<R>) -> Result<()> {
        let temp = NamedTempFile::new_in(&self.dir)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            for record in &table.records {
                let line = serde_json::to_string(record)?;
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            for line in &table.unreadable {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(self.table_path::<R>())
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl RecordStore for JsonlStore {
    fn fetch_all<R: StoredRecord>(&self, user_id: &str) -> Result<Vec<R>> {
        let records: Vec<R> = self
            .read_table::<R>()?
            .into_iter()
            .filter(|r| r.user_id() == user_id)
            .collect();

        tracing::debug!(
            "Fetched {} {} records for {}",
            records.len(),
            R::TABLE,
            user_id
        );
        Ok(records)
    }

    fn upsert_batch<R: StoredRecord>(&mut self, records: &[R]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        // Writers serialize on a sidecar lock so the rename stays atomic
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path::<R>())?;
        lock.lock_exclusive()?;

        let result = read_table_file::<R>(&self.table_path::<R>()).and_then(|mut table| {
            apply_upsert(&mut table.records, records);
            if !table.unreadable.is_empty() {
                tracing::warn!(
                    "Keeping {} unreadable lines in {} as they were",
                    table.unreadable.len(),
                    R::TABLE
                );
            }
            self.write_table(&table)
        });

        // Released on drop as well; a failed unlock must not hide the write result
        if let Err(e) = lock.unlock() {
            tracing::warn!("Failed to release {} lock: {}", R::TABLE, e);
        }

        result?;
        tracing::debug!("Upserted {} records into {}", records.len(), R::TABLE);
        Ok(())
    }
}

/// One table file split into parsed records and lines that did not parse
struct TableFile<R> {
    records: Vec<R>,
    unreadable: Vec<String>,
}

/// Read a JSON Lines table file
///
/// A missing file is an empty table. Lines that fail to parse are set aside
/// with a warning.
fn read_table_file<R: DeserializeOwned>(path: &Path) -> Result<TableFile<R>> {
    let mut table = TableFile {
        records: Vec::new(),
        unreadable: Vec::new(),
    };
    if !path.exists() {
        return Ok(table);
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<R>(&line) {
            Ok(record) => table.records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Skipping unreadable record at {:?} line {}: {}",
                    path,
                    line_num + 1,
                    e
                );
                table.unreadable.push(line);
            }
        }
    }

    file.unlock()?;
    Ok(table)
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory store with failure injection
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<&'static str, Vec<serde_json::Value>>,
    upsert_calls: usize,
    failing_upserts: BTreeSet<usize>,
    fail_fetches: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th upsert call (0-based, counted across tables) fail
    pub fn fail_upsert_call(&mut self, call: usize) {
        self.failing_upserts.insert(call);
    }

    /// Make every fetch fail
    pub fn fail_fetches(&mut self) {
        self.fail_fetches = true;
    }

    /// Number of upsert calls made so far, failed ones included
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls
    }

    fn load<R: StoredRecord>(&self) -> Result<Vec<R>> {
        self.tables
            .get(R::TABLE)
            .map(|rows| {
                rows.iter()
                    .map(|v| serde_json::from_value(v.clone()).map_err(Error::from))
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl RecordStore for MemoryStore {
    fn fetch_all<R: StoredRecord>(&self, user_id: &str) -> Result<Vec<R>> {
        if self.fail_fetches {
            return Err(Error::Store(format!("fetch from {} refused", R::TABLE)));
        }

        Ok(self
            .load::<R>()?
            .into_iter()
            .filter(|r| r.user_id() == user_id)
            .collect())
    }

    fn upsert_batch<R: StoredRecord>(&mut self, records: &[R]) -> Result<()> {
        let call = self.upsert_calls;
        self.upsert_calls += 1;

        if self.failing_upserts.contains(&call) {
            return Err(Error::Store(format!(
                "upsert into {} rejected (call {})",
                R::TABLE,
                call
            )));
        }

        let mut table = self.load::<R>()?;
        apply_upsert(&mut table, records);
        let rows = table
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.tables.insert(R::TABLE, rows);
        Ok(())
    }
}
