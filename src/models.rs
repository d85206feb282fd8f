// Data models for the task list store

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task identifier. Positive, monotonically increasing, never reused
/// within a store lifetime.
pub type TaskId = u64;

/// Maximum task text length in characters, after trimming.
pub const MAX_TEXT_LEN: usize = 200;

/// A single to-do item.
///
/// Field names serialize in camelCase to match the persisted and
/// exported JSON format. Unknown fields on imported tasks are kept in
/// `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Task {
    /// New active task created at the current time.
    pub fn new(id: TaskId, text: String, priority: Priority) -> Self {
        Self {
            id,
            text,
            completed: false,
            priority,
            created_at: now_ms(),
            completed_at: None,
            edited_at: None,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {} (expected low/medium/high)", other)),
        }
    }
}

/// Derived task counts. `total` is always `active + completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

/// The persisted settings record, stored alongside the task collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMeta {
    pub filter: crate::filter::FilterKind,
    pub id_counter: TaskId,
}

impl Default for StoreMeta {
    fn default() -> Self {
        Self {
            filter: crate::filter::FilterKind::All,
            id_counter: 1,
        }
    }
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time before Unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        assert!(ts > 0);
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_priority_serialization() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"high\"");

        let priority: Priority = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(priority, Priority::Medium);
    }

    #[test]
    fn test_task_serialization_uses_camel_case() {
        let task = Task::new(1, "Buy milk".to_string(), Priority::Medium);
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"createdAt\""));
        // Absent timestamps are omitted, not null
        assert!(!json.contains("completedAt"));
        assert!(!json.contains("editedAt"));
    }

    #[test]
    fn test_task_round_trip_preserves_unknown_fields() {
        let json = r##"{"id":3,"text":"Water plants","completed":false,"priority":"low","createdAt":1000,"color":"#00ff00","tags":["home"]}"##;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 3);
        assert_eq!(task.created_at, 1000);
        assert_eq!(task.extra.get("color").and_then(|v| v.as_str()), Some("#00ff00"));

        let out = serde_json::to_string(&task).unwrap();
        assert!(out.contains("\"color\":\"#00ff00\""));
        assert!(out.contains("\"tags\":[\"home\"]"));
    }

    #[test]
    fn test_store_meta_serialization() {
        let meta = StoreMeta::default();
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, "{\"filter\":\"all\",\"idCounter\":1}");
    }
}
