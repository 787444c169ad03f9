//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for quests
///
/// Assigned by the task store, starting at 1 and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quest priority levels
///
/// The model calls these "minor", "common" and "urgent" quests; on the wire
/// they are always `low`, `medium` and `high`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err("Priority must be low, medium, or high".to_string()),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which quests a listing should include
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
    /// High priority, completed or not
    Urgent,
    /// Due on the current calendar date
    Today,
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TaskFilter::All),
            "pending" => Ok(TaskFilter::Pending),
            "completed" => Ok(TaskFilter::Completed),
            "urgent" => Ok(TaskFilter::Urgent),
            "today" => Ok(TaskFilter::Today),
            _ => Err(format!(
                "Unknown filter '{}': expected all, pending, completed, urgent or today",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_parse_rejects_unknown() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
        assert!("HIGH".parse::<Priority>().is_err());
    }

    #[test]
    fn test_filter_serialization() {
        let json = serde_json::to_string(&TaskFilter::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
        let filter: TaskFilter = serde_json::from_str("\"today\"").unwrap();
        assert_eq!(filter, TaskFilter::Today);
    }

    #[test]
    fn test_task_id_is_transparent() {
        assert_eq!(serde_json::to_string(&TaskId(7)).unwrap(), "7");
    }
}
