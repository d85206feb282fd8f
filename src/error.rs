// Error types for the task list store

use crate::models::TaskId;
use thiserror::Error;

/// Failures surfaced by store operations. Every operation returns one of
/// these instead of panicking; the presentation layer decides how each
/// kind is shown to the user.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task text is required")]
    EmptyText,

    #[error("task text is too long ({len} characters, max {max})")]
    TextTooLong { len: usize, max: usize },

    #[error("an active task with the same text already exists")]
    DuplicateText,

    #[error("no task with id {0}")]
    NotFound(TaskId),

    #[error("invalid import payload: {0}")]
    ImportFormat(&'static str),

    #[error("no tasks to export")]
    EmptyExport,
}

impl StoreError {
    /// True for input-validation failures (empty or over-long text).
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::EmptyText | StoreError::TextTooLong { .. })
    }
}

/// Storage read/write failure. Recoverable: the store falls back to an
/// empty collection on load failure and keeps operating in memory after
/// a save failure.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage database: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
