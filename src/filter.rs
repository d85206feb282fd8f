// Filter views over the task collection

use crate::models::{Priority, Task};
use serde::{Deserialize, Serialize};

/// Named view over the task collection. A filter never mutates the
/// underlying order or persisted state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    #[default]
    All,
    Active,
    Completed,
    HighPriority,
}

impl FilterKind {
    /// Whether a task is part of this view.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            FilterKind::All => true,
            FilterKind::Active => !task.completed,
            FilterKind::Completed => task.completed,
            FilterKind::HighPriority => task.priority == Priority::High,
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterKind::All => write!(f, "all"),
            FilterKind::Active => write!(f, "active"),
            FilterKind::Completed => write!(f, "completed"),
            FilterKind::HighPriority => write!(f, "high-priority"),
        }
    }
}

impl std::str::FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FilterKind::All),
            "active" => Ok(FilterKind::Active),
            "completed" => Ok(FilterKind::Completed),
            "high-priority" => Ok(FilterKind::HighPriority),
            other => Err(format!(
                "unknown filter: {} (expected all/active/completed/high-priority)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(completed: bool, priority: Priority) -> Task {
        let mut task = Task::new(1, "walk the dog".to_string(), priority);
        task.completed = completed;
        task
    }

    #[test]
    fn test_all_matches_everything() {
        assert!(FilterKind::All.matches(&task(false, Priority::Low)));
        assert!(FilterKind::All.matches(&task(true, Priority::High)));
    }

    #[test]
    fn test_active_excludes_completed() {
        assert!(FilterKind::Active.matches(&task(false, Priority::Medium)));
        assert!(!FilterKind::Active.matches(&task(true, Priority::Medium)));
    }

    #[test]
    fn test_completed_only() {
        assert!(!FilterKind::Completed.matches(&task(false, Priority::Medium)));
        assert!(FilterKind::Completed.matches(&task(true, Priority::Medium)));
    }

    #[test]
    fn test_high_priority_ignores_completion() {
        assert!(FilterKind::HighPriority.matches(&task(false, Priority::High)));
        assert!(FilterKind::HighPriority.matches(&task(true, Priority::High)));
        assert!(!FilterKind::HighPriority.matches(&task(false, Priority::Medium)));
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&FilterKind::HighPriority).unwrap(), "\"high-priority\"");
        let kind: FilterKind = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(kind, FilterKind::Active);
    }

    #[test]
    fn test_display_round_trips_from_str() {
        for kind in [
            FilterKind::All,
            FilterKind::Active,
            FilterKind::Completed,
            FilterKind::HighPriority,
        ] {
            assert_eq!(kind.to_string().parse::<FilterKind>().unwrap(), kind);
        }
    }
}
