use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub type TaskId = u64;

/// Importance assigned when a task is created without one.
pub const DEFAULT_IMPORTANCE: i64 = 5;

#[derive(Debug, Error)]
#[error("Unknown task status: {0}")]
pub struct UnknownStatus(pub String);

/// Lifecycle state of a task. Deletion is a status, never a row removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "complete")]
    Complete,
    #[serde(alias = "deleted")]
    Deleted,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Complete => "Complete",
            TaskStatus::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "complete" => Ok(TaskStatus::Complete),
            "deleted" => Ok(TaskStatus::Deleted),
            _ => Err(UnknownStatus(value.to_string())),
        }
    }
}

/// One row of `db.json`. Field names are the on-disk names.
///
/// Keys this version does not know about are carried in `extra` and written
/// back after the known fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub task_name: String,
    /// Outer `None`: key absent. `Some(None)`: an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_importance: Option<Option<i64>>,
    pub task_path: String,
    pub task_status: TaskStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskRecord {
    pub fn new(task_id: TaskId, task_name: &str, importance: Option<i64>, task_path: String) -> Self {
        Self {
            task_id,
            task_name: task_name.to_string(),
            task_importance: Some(Some(importance.unwrap_or(DEFAULT_IMPORTANCE))),
            task_path,
            task_status: TaskStatus::Pending,
            extra: Map::new(),
        }
    }

    /// Stored importance, if the record carries a number.
    pub fn stored_importance(&self) -> Option<i64> {
        self.task_importance.flatten()
    }

    pub fn importance(&self) -> i64 {
        self.stored_importance().unwrap_or(DEFAULT_IMPORTANCE)
    }

    pub fn set_importance(&mut self, importance: i64) {
        self.task_importance = Some(Some(importance));
    }
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

pub fn note_file_name(task_id: TaskId) -> String {
    format!("task_{}.md", task_id)
}
