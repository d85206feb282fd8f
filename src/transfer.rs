// Import/export envelope handling

use crate::error::StoreError;
use crate::models::{Priority, Task, TaskId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Version stamp written into export envelopes.
pub const EXPORT_VERSION: &str = "1.0";

/// Fields the store interprets; everything else on an imported task is
/// carried through as-is.
const KNOWN_FIELDS: [&str; 7] = [
    "id",
    "text",
    "completed",
    "priority",
    "createdAt",
    "completedAt",
    "editedAt",
];

/// The JSON wrapper written by export and accepted by import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub tasks: Vec<Task>,
    pub export_date: String,
    pub version: String,
}

impl ExportEnvelope {
    pub(crate) fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            export_date: Utc::now().to_rfc3339(),
            version: EXPORT_VERSION.to_string(),
        }
    }
}

/// How imported tasks combine with the existing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Prepend imported tasks ahead of existing ones.
    Merge,
    /// Discard the existing collection entirely.
    Replace,
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportMode::Merge => write!(f, "merge"),
            ImportMode::Replace => write!(f, "replace"),
        }
    }
}

impl std::str::FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(ImportMode::Merge),
            "replace" => Ok(ImportMode::Replace),
            other => Err(format!("unknown import mode: {} (expected merge/replace)", other)),
        }
    }
}

/// A task-shaped entry accepted from an import payload. Only `text` is
/// required; everything else falls back to defaults rather than
/// rejecting the entry.
#[derive(Debug, Clone)]
pub(crate) struct IncomingTask {
    text: String,
    completed: bool,
    priority: Priority,
    created_at: Option<i64>,
    completed_at: Option<i64>,
    edited_at: Option<i64>,
    extra: BTreeMap<String, Value>,
}

impl IncomingTask {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = obj.get("text")?.as_str()?.trim();
        if text.is_empty() {
            return None;
        }

        let extra = obj
            .iter()
            .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            text: text.to_string(),
            completed: obj.get("completed").and_then(Value::as_bool).unwrap_or(false),
            priority: obj
                .get("priority")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            created_at: obj.get("createdAt").and_then(Value::as_i64),
            completed_at: obj.get("completedAt").and_then(Value::as_i64),
            edited_at: obj.get("editedAt").and_then(Value::as_i64),
            extra,
        })
    }

    /// Materialize with a freshly allocated id. `createdAt` is defaulted
    /// to the import time only when the entry did not carry one.
    pub(crate) fn into_task(self, id: TaskId, now: i64) -> Task {
        Task {
            id,
            text: self.text,
            completed: self.completed,
            priority: self.priority,
            created_at: self.created_at.unwrap_or(now),
            completed_at: self.completed_at,
            edited_at: self.edited_at,
            extra: self.extra,
        }
    }
}

/// Decode a raw import payload: either the export envelope or a bare
/// JSON array of task-like objects. Entries without a usable `text` are
/// dropped; a payload yielding nothing is an error.
pub(crate) fn decode_payload(raw: &str) -> Result<Vec<IncomingTask>, StoreError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|_| StoreError::ImportFormat("not valid JSON"))?;

    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("tasks") {
            Some(Value::Array(items)) => items,
            _ => return Err(StoreError::ImportFormat("expected a task array")),
        },
        _ => return Err(StoreError::ImportFormat("expected a task array")),
    };

    let total = entries.len();
    let incoming: Vec<IncomingTask> = entries.iter().filter_map(IncomingTask::from_value).collect();
    if incoming.len() < total {
        warn!(
            skipped = total - incoming.len(),
            "dropped import entries without usable text"
        );
    }

    if incoming.is_empty() {
        return Err(StoreError::ImportFormat("no valid tasks"));
    }
    Ok(incoming)
}
