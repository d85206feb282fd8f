// TodoStore - task list management over pluggable key-value persistence

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod persist;
pub mod store;
pub mod transfer;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use error::{PersistenceError, StoreError};
pub use filter::FilterKind;
pub use models::{MAX_TEXT_LEN, Priority, Stats, StoreMeta, Task, TaskId, now_ms};
pub use persist::{JsonFileAdapter, MemoryAdapter, PersistenceAdapter, SqliteAdapter};
pub use store::{ClearOutcome, DeleteOutcome, TaskStore};
pub use transfer::{EXPORT_VERSION, ExportEnvelope, ImportMode};
