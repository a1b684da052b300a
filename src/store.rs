use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::{de::DeserializeOwned, Serialize, Deserialize};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::ledger::{HistoryRecord, InMemoryLedger, WorkloadCounters, WorkloadLedger};
use crate::schedule::TeacherSchedule;

pub const SCHEDULES_FILE: &str = "horarios.json";
pub const COUNTERS_FILE: &str = "sustituciones_contador.json";
pub const HISTORY_FILE: &str = "historial_sustituciones.csv";

const SLOT_SEPARATOR: &str = ", ";

/// Flat CSV shape of a [`HistoryRecord`]
#[derive(Debug, Serialize, Deserialize)]
struct HistoryRow {
    timestamp: String,
    #[serde(rename = "profesor_sustituto")]
    substitute: String,
    #[serde(rename = "profesor_ausente")]
    absent_teacher: String,
    #[serde(rename = "dia_semana")]
    day: String,
    #[serde(rename = "fecha_sustitucion")]
    date: String,
    #[serde(rename = "slots_cubiertos_detalle")]
    slots: String,
    #[serde(rename = "numero_slots")]
    slot_count: usize,
}

impl From<&HistoryRecord> for HistoryRow {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            timestamp: record.timestamp.clone(),
            substitute: record.substitute.clone(),
            absent_teacher: record.absent_teacher.clone(),
            day: record.day.clone(),
            date: record.date.clone(),
            slots: record.slots.join(SLOT_SEPARATOR),
            slot_count: record.slot_count,
        }
    }
}

impl From<HistoryRow> for HistoryRecord {
    fn from(row: HistoryRow) -> Self {
        let slots: Vec<String> = row
            .slots
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        HistoryRecord {
            timestamp: row.timestamp,
            substitute: row.substitute,
            absent_teacher: row.absent_teacher,
            day: row.day,
            date: row.date,
            slots,
            slot_count: row.slot_count,
        }
    }
}

/// Files backing schedules, workload counters and history in one directory
#[derive(Debug, Clone)]
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    /// Saved schedules; an empty list if none were saved yet.
    pub fn load_schedules(&self) -> Result<Vec<TeacherSchedule>, StoreError> {
        Ok(read_json(&self.path(SCHEDULES_FILE))?.unwrap_or_default())
    }

    pub fn save_schedules(&self, schedules: &[TeacherSchedule]) -> Result<(), StoreError> {
        write_json(self, SCHEDULES_FILE, schedules)?;
        info!(teachers = schedules.len(), "schedules saved");
        Ok(())
    }

    /// Saved counters; empty if none were saved yet.
    pub fn load_counters(&self) -> Result<WorkloadCounters, StoreError> {
        Ok(read_json(&self.path(COUNTERS_FILE))?.unwrap_or_default())
    }

    pub fn save_counters(&self, counters: &WorkloadCounters) -> Result<(), StoreError> {
        write_json(self, COUNTERS_FILE, counters)
    }

    /// Appends records to the history log, writing the header when the file is new.
    pub fn append_history(&self, records: &[HistoryRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        self.ensure_dir()?;
        let path = self.path(HISTORY_FILE);
        let file_exists = path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;

        let mut wtr = WriterBuilder::new().has_headers(!file_exists).from_writer(file);
        for record in records {
            wtr.serialize(HistoryRow::from(record))?;
        }
        wtr.flush().map_err(|source| StoreError::Io { path, source })?;
        Ok(())
    }

    /// Every history record, oldest first
    pub fn load_history(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let path = self.path(HISTORY_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = Vec::new();
        for row in reader.deserialize::<HistoryRow>() {
            records.push(HistoryRecord::from(row?));
        }
        Ok(records)
    }

    /// Schedules, or an empty list when the stored file can't be read.
    pub fn schedules_or_empty(&self) -> Vec<TeacherSchedule> {
        self.load_schedules().unwrap_or_else(|err| {
            warn!(%err, "could not load schedules, continuing with none");
            Vec::new()
        })
    }

    /// Counters, or empty ones when the stored file can't be read.
    pub fn counters_or_empty(&self) -> WorkloadCounters {
        self.load_counters().unwrap_or_else(|err| {
            warn!(%err, "could not load workload counters, continuing with none");
            WorkloadCounters::new()
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map(Some).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(store: &DataStore, file_name: &str, value: &T) -> Result<(), StoreError> {
    store.ensure_dir()?;
    let path = store.path(file_name);
    let body = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, body).map_err(|source| StoreError::Io { path, source })
}

/// A [`WorkloadLedger`] persisted in a [`DataStore`].
///
/// Changes stay in memory until [`FileLedger::flush`] writes the counters and
/// appends the new history records. A failed flush discards them.
#[derive(Debug)]
pub struct FileLedger {
    store: DataStore,
    inner: InMemoryLedger,
    // state as of the last successful flush
    saved: InMemoryLedger,
    pending: Vec<HistoryRecord>,
    dirty: bool,
}

impl FileLedger {
    pub fn open(store: DataStore) -> Result<Self, StoreError> {
        let counters = store.load_counters()?;
        let history = store.load_history()?;
        let inner = InMemoryLedger::new(counters, history);
        Ok(Self {
            store,
            saved: inner.clone(),
            inner,
            pending: Vec::new(),
            dirty: false,
        })
    }

    /// Persists everything changed since the last flush.
    ///
    /// On error the unsaved increments and history records are dropped, so
    /// the ledger is back at its last persisted state and the caller can retry
    /// the whole commit without counting it twice.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty && self.pending.is_empty() {
            return Ok(());
        }
        let written = self
            .store
            .save_counters(self.inner.counters())
            .and_then(|()| self.store.append_history(&self.pending));
        if let Err(err) = written {
            warn!(%err, discarded = self.pending.len(), "flush failed, rolling back unsaved changes");
            self.rollback();
            return Err(err);
        }
        info!(records = self.pending.len(), "workload ledger flushed");
        self.saved = self.inner.clone();
        self.pending.clear();
        self.dirty = false;
        Ok(())
    }

    fn rollback(&mut self) {
        // the counters file may already hold the new values if only the history append failed
        if let Err(err) = self.store.save_counters(self.saved.counters()) {
            warn!(%err, "could not restore saved workload counters");
        }
        self.inner = self.saved.clone();
        self.pending.clear();
        self.dirty = false;
    }
}

impl WorkloadLedger for FileLedger {
    fn counters(&self) -> &WorkloadCounters {
        self.inner.counters()
    }

    fn increment(&mut self, name: &str) -> bool {
        let changed = self.inner.increment(name);
        self.dirty |= changed;
        changed
    }

    fn record_history(&mut self, entry: HistoryRecord) {
        self.pending.push(entry.clone());
        self.inner.record_history(entry);
    }

    fn history(&self) -> &[HistoryRecord] {
        self.inner.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Activity;

    fn record(sub: &str, slots: &[&str]) -> HistoryRecord {
        HistoryRecord::new(
            "2026-10-19T08:00:00",
            sub,
            "Ausente",
            "Lunes",
            "2026-10-19",
            slots.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path().join("nested"));
        assert!(store.load_schedules().unwrap().is_empty());
        assert!(store.load_counters().unwrap().is_empty());
        assert!(store.load_history().unwrap().is_empty());
    }

    #[test]
    fn test_schedules_and_counters_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let schedules = vec![TeacherSchedule::new("Ana").with_activity("Lunes", Activity::duty("09:00-09:30", "GUARDIA"))];
        store.save_schedules(&schedules).unwrap();
        assert_eq!(store.load_schedules().unwrap(), schedules);

        let counters = WorkloadCounters::from_iter([("Ana", 3)]);
        store.save_counters(&counters).unwrap();
        assert_eq!(store.load_counters().unwrap(), counters);
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        fs::write(dir.path().join(COUNTERS_FILE), "{not json").unwrap();
        assert!(matches!(store.load_counters(), Err(StoreError::Json { .. })));
        assert!(store.counters_or_empty().is_empty());
    }

    #[test]
    fn test_history_appends_across_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        store.append_history(&[record("A", &["09:00-09:30", "09:30-10:00"])]).unwrap();
        store.append_history(&[record("B", &["10:00-10:30"])]).unwrap();

        let history = store.load_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].substitute, "A");
        assert_eq!(history[0].slots, vec!["09:00-09:30", "09:30-10:00"]);
        assert_eq!(history[0].slot_count, 2);
        assert_eq!(history[1].substitute, "B");
    }

    #[test]
    fn test_file_ledger_flushes_only_new_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        store.append_history(&[record("Old", &["09:00-09:30"])]).unwrap();

        let mut ledger = FileLedger::open(store.clone()).unwrap();
        assert_eq!(ledger.history().len(), 1);
        ledger.increment("A");
        ledger.record_history(record("A", &["09:30-10:00"]));
        ledger.flush().unwrap();
        ledger.flush().unwrap();

        assert_eq!(store.load_counters().unwrap().get("A"), 1);
        let history = store.load_history().unwrap();
        let subs: Vec<&str> = history.iter().map(|h| h.substitute.as_str()).collect();
        assert_eq!(subs, vec!["Old", "A"]);

        let reopened = FileLedger::open(store).unwrap();
        assert_eq!(reopened.counters().get("A"), 1);
        assert_eq!(reopened.history().len(), 2);
    }

    #[test]
    fn test_failed_flush_discards_unsaved_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let mut ledger = FileLedger::open(store.clone()).unwrap();

        let counters_path = dir.path().join(COUNTERS_FILE);
        fs::create_dir(&counters_path).unwrap();
        for _ in 0..3 {
            ledger.increment("Y");
        }
        ledger.record_history(record("Y", &["09:00-09:30", "09:30-10:00", "10:00-10:30"]));
        assert!(ledger.flush().is_err());
        assert_eq!(ledger.counters().get("Y"), 0);
        assert!(ledger.history().is_empty());

        // retrying the same commit once the file is writable counts it once
        fs::remove_dir(&counters_path).unwrap();
        for _ in 0..3 {
            ledger.increment("Y");
        }
        ledger.record_history(record("Y", &["09:00-09:30", "09:30-10:00", "10:00-10:30"]));
        ledger.flush().unwrap();
        ledger.flush().unwrap();

        assert_eq!(store.load_counters().unwrap().get("Y"), 3);
        assert_eq!(store.load_history().unwrap().len(), 1);
    }

    #[test]
    fn test_history_uses_original_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        store.append_history(&[record("A", &["09:00-09:30"])]).unwrap();
        let raw = fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap();
        let header = raw.lines().next().unwrap();
        assert_eq!(
            header,
            "timestamp,profesor_sustituto,profesor_ausente,dia_semana,fecha_sustitucion,slots_cubiertos_detalle,numero_slots"
        );
    }
}
