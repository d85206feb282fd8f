// Persistence adapters: key-value storage for tasks and settings

use crate::error::PersistenceError;
use crate::models::{StoreMeta, Task};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage key for the task collection record.
pub const TASKS_KEY: &str = "tasks";
/// Storage key for the settings record.
pub const SETTINGS_KEY: &str = "settings";

/// Snapshot of everything the store persists: the task collection and
/// the settings record, stored under separate keys.
#[derive(Debug, Clone)]
pub struct PersistedState {
    pub tasks: Vec<Task>,
    pub meta: StoreMeta,
}

/// Key-value storage consumed by the store.
///
/// Failures are non-fatal to the store: a failed `load` falls back to an
/// empty collection, a failed `save` leaves the store running in memory
/// with a warning surfaced to the caller.
pub trait PersistenceAdapter {
    /// Load the saved state. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError>;

    /// Save the full state, replacing whatever was stored before.
    fn save(&mut self, tasks: &[Task], meta: &StoreMeta) -> Result<(), PersistenceError>;
}

// ============================================================================
// JSON file adapter
// ============================================================================

/// Stores the two records as `tasks.json` and `settings.json` in a
/// directory. Writes take an exclusive lock and are fsynced.
pub struct JsonFileAdapter {
    base_path: PathBuf,
}

impl JsonFileAdapter {
    /// Open an adapter rooted at the given directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn tasks_path(&self) -> PathBuf {
        self.base_path.join(format!("{}.json", TASKS_KEY))
    }

    fn settings_path(&self) -> PathBuf {
        self.base_path.join(format!("{}.json", SETTINGS_KEY))
    }

    fn write_locked(path: &Path, contents: &str) -> Result<(), PersistenceError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        // Acquire exclusive lock before writing
        file.lock_exclusive()?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;

        // Lock is automatically released when file is dropped
        Ok(())
    }
}

impl PersistenceAdapter for JsonFileAdapter {
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        let tasks_path = self.tasks_path();
        if !tasks_path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&tasks_path)?;
        let tasks: Vec<Task> = serde_json::from_str(&raw)?;

        let meta = match fs::read_to_string(self.settings_path()) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreMeta::default(),
            Err(e) => return Err(e.into()),
        };

        debug!(count = tasks.len(), path = ?tasks_path, "loaded tasks from disk");
        Ok(Some(PersistedState { tasks, meta }))
    }

    fn save(&mut self, tasks: &[Task], meta: &StoreMeta) -> Result<(), PersistenceError> {
        Self::write_locked(&self.tasks_path(), &serde_json::to_string(tasks)?)?;
        Self::write_locked(&self.settings_path(), &serde_json::to_string(meta)?)?;
        Ok(())
    }
}

// ============================================================================
// SQLite adapter
// ============================================================================

/// Stores both records as rows of a single key-value table.
pub struct SqliteAdapter {
    db: Connection,
}

impl SqliteAdapter {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let db = Connection::open(path)?;
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        Ok(Self { db })
    }

    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }
}

impl PersistenceAdapter for SqliteAdapter {
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        let raw_tasks = match self.get(TASKS_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let tasks: Vec<Task> = serde_json::from_str(&raw_tasks)?;

        let meta = match self.get(SETTINGS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => StoreMeta::default(),
        };

        debug!(count = tasks.len(), "loaded tasks from database");
        Ok(Some(PersistedState { tasks, meta }))
    }

    fn save(&mut self, tasks: &[Task], meta: &StoreMeta) -> Result<(), PersistenceError> {
        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![TASKS_KEY, serde_json::to_string(tasks)?],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![SETTINGS_KEY, serde_json::to_string(meta)?],
        )?;
        tx.commit()?;
        Ok(())
    }
}

// ============================================================================
// In-memory adapter
// ============================================================================

/// Keeps state in process memory. Used by tests and for stores that
/// should not touch disk at all.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    state: Option<PersistedState>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved state, if any.
    pub fn state(&self) -> Option<&PersistedState> {
        self.state.as_ref()
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, tasks: &[Task], meta: &StoreMeta) -> Result<(), PersistenceError> {
        self.state = Some(PersistedState {
            tasks: tasks.to_vec(),
            meta: meta.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterKind;
    use crate::models::Priority;
    use tempfile::TempDir;

    fn sample_state() -> (Vec<Task>, StoreMeta) {
        let tasks = vec![
            Task::new(2, "Write report".to_string(), Priority::High),
            Task::new(1, "Buy milk".to_string(), Priority::Medium),
        ];
        let meta = StoreMeta {
            filter: FilterKind::Active,
            id_counter: 3,
        };
        (tasks, meta)
    }

    #[test]
    fn test_json_adapter_round_trip() {
        let temp = TempDir::new().unwrap();
        let mut adapter = JsonFileAdapter::open(temp.path()).unwrap();

        let (tasks, meta) = sample_state();
        adapter.save(&tasks, &meta).unwrap();

        assert!(temp.path().join("tasks.json").exists());
        assert!(temp.path().join("settings.json").exists());

        let state = adapter.load().unwrap().unwrap();
        assert_eq!(state.tasks.len(), 2);
        assert_eq!(state.tasks[0].text, "Write report");
        assert_eq!(state.meta, meta);
    }

    #[test]
    fn test_json_adapter_empty_dir_loads_none() {
        let temp = TempDir::new().unwrap();
        let adapter = JsonFileAdapter::open(temp.path()).unwrap();
        assert!(adapter.load().unwrap().is_none());
    }

    #[test]
    fn test_json_adapter_missing_settings_defaults() {
        let temp = TempDir::new().unwrap();
        let mut adapter = JsonFileAdapter::open(temp.path()).unwrap();

        let (tasks, meta) = sample_state();
        adapter.save(&tasks, &meta).unwrap();
        fs::remove_file(temp.path().join("settings.json")).unwrap();

        let state = adapter.load().unwrap().unwrap();
        assert_eq!(state.meta, StoreMeta::default());
    }

    #[test]
    fn test_json_adapter_corrupt_tasks_is_an_error() {
        let temp = TempDir::new().unwrap();
        let adapter = JsonFileAdapter::open(temp.path()).unwrap();

        fs::write(temp.path().join("tasks.json"), "{not json").unwrap();
        assert!(adapter.load().is_err());
    }

    #[test]
    fn test_sqlite_adapter_round_trip() {
        let temp = TempDir::new().unwrap();
        let mut adapter = SqliteAdapter::open(temp.path().join("todostore.db")).unwrap();

        assert!(adapter.load().unwrap().is_none());

        let (tasks, meta) = sample_state();
        adapter.save(&tasks, &meta).unwrap();

        let state = adapter.load().unwrap().unwrap();
        assert_eq!(state.tasks.len(), 2);
        assert_eq!(state.meta, meta);
    }

    #[test]
    fn test_sqlite_adapter_overwrites_previous_save() {
        let temp = TempDir::new().unwrap();
        let mut adapter = SqliteAdapter::open(temp.path().join("todostore.db")).unwrap();

        let (tasks, meta) = sample_state();
        adapter.save(&tasks, &meta).unwrap();
        adapter.save(&tasks[..1], &meta).unwrap();

        let state = adapter.load().unwrap().unwrap();
        assert_eq!(state.tasks.len(), 1);
    }

    #[test]
    fn test_memory_adapter_round_trip() {
        let mut adapter = MemoryAdapter::new();
        assert!(adapter.load().unwrap().is_none());

        let (tasks, meta) = sample_state();
        adapter.save(&tasks, &meta).unwrap();

        let state = adapter.load().unwrap().unwrap();
        assert_eq!(state.tasks.len(), 2);
        assert_eq!(state.meta.id_counter, 3);
    }
}
